use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{Appointment, AppointmentStatus, NewAppointment, PatientProfile};

mod memory;
mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// Persistence boundary for appointments and the patient profiles they reference.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Rows of the doctor's day that still hold a slot, ordered by start time.
    async fn list_non_cancelled_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Inserts in `pending`. Fails with `StoreError::Conflict` when the interval
    /// overlaps a non-cancelled row of the same doctor and date.
    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    /// Single-row status change, applied only while the row is still in `expected`.
    /// A row that moved on meanwhile yields `StoreError::Conflict` and is left untouched.
    /// `notes_append` is added as a new line after any existing notes.
    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        notes_append: Option<String>,
    ) -> Result<Appointment, StoreError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Ordered by date then start time.
    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    /// Ordered by date then start time.
    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>, StoreError>;
}

pub(crate) fn append_note(existing: Option<String>, addition: Option<String>) -> Option<String> {
    match (existing.filter(|n| !n.trim().is_empty()), addition) {
        (Some(current), Some(extra)) => Some(format!("{}\n{}", current, extra)),
        (None, Some(extra)) => Some(extra),
        (current, None) => current,
    }
}
