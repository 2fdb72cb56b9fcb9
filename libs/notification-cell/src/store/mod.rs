use async_trait::async_trait;
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{NewNotification, Notification};

mod memory;
mod supabase;

pub use memory::InMemoryNotificationStore;
pub use supabase::SupabaseNotificationStore;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError>;

    async fn get(&self, notification_id: Uuid) -> Result<Option<Notification>, StoreError>;

    async fn mark_read(&self, notification_id: Uuid) -> Result<Notification, StoreError>;
}
