use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};

use super::NotificationStore;
use crate::models::{NewNotification, Notification};

const NOTIFICATIONS: &str = "/rest/v1/notifications";

pub struct SupabaseNotificationStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseNotificationStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn first_row(rows: Vec<Value>, what: &str) -> Result<Notification, StoreError> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))?;
        Ok(serde_json::from_value(row)?)
    }
}

#[async_trait]
impl NotificationStore for SupabaseNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let body = json!({
            "user_id": notification.user_id,
            "title": notification.title,
            "message": notification.message,
            "is_read": false
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                NOTIFICATIONS,
                Some(self.supabase.service_token()),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        Self::first_row(rows, "inserted notification")
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let path = format!("{}?user_id=eq.{}&order=created_at.desc", NOTIFICATIONS, user_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(self.supabase.service_token()), None)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn get(&self, notification_id: Uuid) -> Result<Option<Notification>, StoreError> {
        let path = format!("{}?id=eq.{}", NOTIFICATIONS, notification_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(self.supabase.service_token()), None)
            .await?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .transpose()
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<Notification, StoreError> {
        let path = format!("{}?id=eq.{}", NOTIFICATIONS, notification_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(self.supabase.service_token()),
                Some(json!({ "is_read": true })),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        Self::first_row(rows, &format!("notification {}", notification_id))
    }
}
