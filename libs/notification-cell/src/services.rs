use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Notification, NotificationError};
use crate::store::NotificationStore;

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, NotificationError> {
        debug!("Fetching notifications for user: {}", user_id);
        Ok(self.store.list_for_user(user_id).await?)
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification, NotificationError> {
        let notification = self
            .store
            .get(notification_id)
            .await?
            .ok_or(NotificationError::NotFound)?;

        if notification.user_id != user_id {
            warn!("User {} attempted to read notification {}", user_id, notification_id);
            return Err(NotificationError::OwnershipViolation);
        }

        if notification.is_read {
            return Ok(notification);
        }

        let updated = self.store.mark_read(notification_id).await?;
        info!("Notification {} marked read", notification_id);
        Ok(updated)
    }
}
