use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::services::DoctorService;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::user_uuid;

use crate::models::{AppointmentError, BookAppointmentRequest, CancelAppointmentRequest, SlotsQuery};
use crate::router::AppointmentCellState;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppointmentCellState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    DoctorService::new(state.doctors.clone())
        .get_verified_doctor(doctor_id)
        .await
        .map_err(AppointmentError::from)?;

    let slots = state
        .availability_service()
        .compute_available_slots(doctor_id, query.date)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots
    })))
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = user_uuid(&user)?;

    let appointment = state
        .booking_service()
        .validate_and_book(patient_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment requested; awaiting doctor confirmation"
    }))))
}

// ==============================================================================
// QUERIES
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentCellState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor_id = user_uuid(&user)?;

    let appointment = state
        .query_service()
        .get_appointment(actor_id, user.is_admin(), appointment_id)
        .await?;

    Ok(Json(json!(appointment)))
}

/// Doctors see the appointments booked with them, everyone else their own bookings.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<AppointmentCellState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = user_uuid(&user)?;
    let queries = state.query_service();

    let (role, appointments) = if user.is_doctor() {
        ("doctor", queries.list_doctor_appointments(user_id).await?)
    } else {
        ("patient", queries.list_patient_appointments(user_id).await?)
    };

    Ok(Json(json!({
        "role": role,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentCellState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor_id = user_uuid(&user)?;

    let appointment = state
        .lifecycle_service()
        .cancel(actor_id, appointment_id, &request.reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<AppointmentCellState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor_id = user_uuid(&user)?;

    let appointment = state
        .lifecycle_service()
        .complete(actor_id, appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment completed"
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<AppointmentCellState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor_id = user_uuid(&user)?;

    let appointment = state
        .lifecycle_service()
        .confirm(actor_id, appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment confirmed"
    })))
}
