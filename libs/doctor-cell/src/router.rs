use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::store::DoctorStore;

#[derive(Clone)]
pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DoctorStore>,
}

impl DoctorCellState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn DoctorStore>) -> Self {
        Self { config, store }
    }
}

pub fn doctor_routes(state: DoctorCellState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/search", get(handlers::search_doctors_public))
        .route("/{doctor_id}", get(handlers::get_doctor_public))
        .route("/{doctor_id}/availability", get(handlers::list_availability_public));

    // Schedule management is restricted to the owning doctor
    let protected_routes = Router::new()
        .route("/{doctor_id}/availability", post(handlers::create_availability))
        .route("/{doctor_id}/availability/{template_id}", delete(handlers::delete_availability))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
