use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::user_uuid;

use crate::models::{CreateTemplateRequest, DoctorSearchFilters};
use crate::router::DoctorCellState;
use crate::services::{AvailabilityService, DoctorService};

#[derive(Debug, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub limit: Option<usize>,
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn search_doctors_public(
    State(state): State<DoctorCellState>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());

    let filters = DoctorSearchFilters {
        specialty: query.specialty.filter(|s| !s.trim().is_empty()),
        location: query.location.filter(|s| !s.trim().is_empty()),
        language: query.language.filter(|s| !s.trim().is_empty()),
        limit: query.limit,
    };

    let doctors = doctor_service.search_doctors(filters).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_public(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());

    let doctor = doctor_service.get_verified_doctor(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn list_availability_public(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    DoctorService::new(state.store.clone()).get_verified_doctor(doctor_id).await?;

    let templates = AvailabilityService::new(state.store.clone())
        .list_templates(doctor_id)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "templates": templates
    })))
}

// ==============================================================================
// DOCTOR-ONLY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor_id = user_uuid(&user)?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let template = availability_service
        .create_template(actor_id, doctor_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "template": template
    }))))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<DoctorCellState>,
    Path((doctor_id, template_id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor_id = user_uuid(&user)?;

    AvailabilityService::new(state.store.clone())
        .delete_template(actor_id, doctor_id, template_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability removed"
    })))
}
