use std::sync::Arc;

use anyhow::bail;
use axum::{
    Router,
    routing::get,
};
use tracing::info;

use appointment_cell::router::{appointment_routes, AppointmentCellState};
use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use doctor_cell::router::{doctor_routes, DoctorCellState};
use doctor_cell::store::{DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
use notification_cell::router::{notification_routes, NotificationCellState};
use notification_cell::sender::sender_for;
use notification_cell::store::{InMemoryNotificationStore, NotificationStore, SupabaseNotificationStore};
use shared_config::{AppConfig, StorageBackend};

/// One store per concern, shared by every cell that touches it.
struct Stores {
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
    notifications: Arc<dyn NotificationStore>,
}

fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory stores; data is lost on restart");
            Ok(Stores {
                doctors: Arc::new(InMemoryDoctorStore::new()),
                appointments: Arc::new(InMemoryAppointmentStore::new()),
                notifications: Arc::new(InMemoryNotificationStore::new()),
            })
        }
        StorageBackend::Supabase => {
            if !config.is_supabase_configured() {
                bail!("STORAGE_BACKEND=supabase requires SUPABASE_URL, SUPABASE_ANON_PUBLIC_KEY and SUPABASE_SERVICE_ROLE_KEY");
            }
            info!("Using Supabase stores at {}", config.supabase_url);
            Ok(Stores {
                doctors: Arc::new(SupabaseDoctorStore::new(config)),
                appointments: Arc::new(SupabaseAppointmentStore::new(config)),
                notifications: Arc::new(SupabaseNotificationStore::new(config)),
            })
        }
    }
}

pub fn create_router(state: Arc<AppConfig>) -> anyhow::Result<Router> {
    let stores = build_stores(&state)?;
    let notifier = sender_for(&state, stores.notifications.clone());

    let doctor_state = DoctorCellState::new(state.clone(), stores.doctors.clone());
    let appointment_state = AppointmentCellState::new(
        state.clone(),
        stores.doctors.clone(),
        stores.appointments.clone(),
        notifier,
    );
    let notification_state = NotificationCellState::new(state.clone(), stores.notifications.clone());

    Ok(Router::new()
        .route("/", get(|| async { "MediBook API is running!" }))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
        .nest("/notifications", notification_routes(notification_state)))
}
