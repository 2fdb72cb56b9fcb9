use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{NewNotification, NotificationError};
use crate::store::NotificationStore;

/// Outbound boundary used by the booking flows. Callers treat failures as non-fatal.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<(), NotificationError>;
}

/// Persists each message into the recipient's inbox.
pub struct InboxNotifier {
    store: Arc<dyn NotificationStore>,
}

impl InboxNotifier {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationSender for InboxNotifier {
    async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<(), NotificationError> {
        let notification = self
            .store
            .insert(NewNotification {
                user_id,
                title: title.to_string(),
                message: message.to_string(),
            })
            .await?;

        debug!("Notification {} stored for user {}", notification.id, user_id);
        Ok(())
    }
}

/// Mock mode: messages are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<(), NotificationError> {
        info!("[mock notification] to {}: {} - {}", user_id, title, message);
        Ok(())
    }
}

pub fn sender_for(config: &AppConfig, store: Arc<dyn NotificationStore>) -> Arc<dyn NotificationSender> {
    if config.notifications_mock_mode {
        info!("Notifications running in mock mode; nothing will be persisted");
        Arc::new(LogNotifier)
    } else {
        Arc::new(InboxNotifier::new(store))
    }
}
