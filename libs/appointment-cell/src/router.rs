use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use doctor_cell::store::DoctorStore;
use notification_cell::NotificationSender;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{
    AppointmentLifecycleService, AppointmentQueryService, BookingService, SlotAvailabilityService,
    SlotLocks,
};
use crate::store::AppointmentStore;

/// Shared by every appointment route. `locks` is the single registry that
/// serializes writes to a doctor's day within this process.
#[derive(Clone)]
pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub doctors: Arc<dyn DoctorStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub notifier: Arc<dyn NotificationSender>,
    pub locks: Arc<SlotLocks>,
}

impl AppointmentCellState {
    pub fn new(
        config: Arc<AppConfig>,
        doctors: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            config,
            doctors,
            appointments,
            notifier,
            locks: Arc::new(SlotLocks::new()),
        }
    }

    pub fn availability_service(&self) -> SlotAvailabilityService {
        SlotAvailabilityService::new(self.doctors.clone(), self.appointments.clone())
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(
            self.doctors.clone(),
            self.appointments.clone(),
            self.notifier.clone(),
            self.locks.clone(),
        )
    }

    pub fn lifecycle_service(&self) -> AppointmentLifecycleService {
        AppointmentLifecycleService::new(
            self.doctors.clone(),
            self.appointments.clone(),
            self.notifier.clone(),
            self.locks.clone(),
        )
    }

    pub fn query_service(&self) -> AppointmentQueryService {
        AppointmentQueryService::new(self.appointments.clone())
    }
}

pub fn appointment_routes(state: AppointmentCellState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/doctors/{doctor_id}/slots", get(handlers::get_available_slots));

    // Booking and lifecycle operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
