use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::store::NotificationStore;

#[derive(Clone)]
pub struct NotificationCellState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn NotificationStore>,
}

impl NotificationCellState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn NotificationStore>) -> Self {
        Self { config, store }
    }
}

pub fn notification_routes(state: NotificationCellState) -> Router {
    // Every inbox operation is scoped to the caller
    let protected_routes = Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/{notification_id}/read", post(handlers::mark_notification_read))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
