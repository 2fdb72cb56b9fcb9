pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::*;
pub use router::{appointment_routes, AppointmentCellState};
pub use services::{
    AppointmentLifecycleService, AppointmentQueryService, BookingService, SlotAvailabilityService,
    SlotLocks,
};
pub use store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
