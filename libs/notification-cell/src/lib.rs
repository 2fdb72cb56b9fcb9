pub mod handlers;
pub mod models;
pub mod router;
pub mod sender;
pub mod services;
pub mod store;

pub use models::*;
pub use router::{notification_routes, NotificationCellState};
pub use sender::{sender_for, InboxNotifier, LogNotifier, NotificationSender};
pub use services::NotificationService;
pub use store::{InMemoryNotificationStore, NotificationStore, SupabaseNotificationStore};
