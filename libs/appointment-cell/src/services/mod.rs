pub mod availability;
pub mod booking;
pub mod lifecycle;
pub mod locks;
mod notices;
pub mod query;
pub mod slots;

pub use availability::SlotAvailabilityService;
pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use locks::SlotLocks;
pub use query::AppointmentQueryService;
pub use slots::{format_slot, parse_slot};
