use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::StoreError;

use super::NotificationStore;
use crate::models::{NewNotification, Notification};

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notifications.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let stored = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        // Insertion order breaks ties between identical timestamps.
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, notification_id: Uuid) -> Result<Option<Notification>, StoreError> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .find(|n| n.id == notification_id)
            .cloned())
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<Notification, StoreError> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?;
        notification.is_read = true;
        Ok(notification.clone())
    }
}
