pub mod handlers;
pub mod router;
pub mod models;
pub mod services;
pub mod store;

pub use models::*;
pub use router::{doctor_routes, DoctorCellState};
pub use services::{AvailabilityService, DoctorService};
pub use store::{DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
