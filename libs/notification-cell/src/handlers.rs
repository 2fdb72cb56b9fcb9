use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::user_uuid;

use crate::router::NotificationCellState;
use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<NotificationCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = user_uuid(&user)?;
    let notifications = NotificationService::new(state.store.clone())
        .list_notifications(user_id)
        .await?;

    let unread = notifications.iter().filter(|n| !n.is_read).count();

    Ok(Json(json!({
        "notifications": notifications,
        "total": notifications.len(),
        "unread": unread
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<NotificationCellState>,
    Path(notification_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = user_uuid(&user)?;
    let notification = NotificationService::new(state.store.clone())
        .mark_read(user_id, notification_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "notification": notification
    })))
}
