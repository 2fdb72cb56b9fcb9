use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::day_of_week;
use doctor_cell::store::DoctorStore;

use crate::models::{AppointmentError, Slot};
use crate::services::slots::{candidate_slots, subtract_booked};
use crate::store::AppointmentStore;

/// Open slots of a doctor's day: the weekly templates for that weekday, tiled,
/// minus every non-cancelled booking.
pub struct SlotAvailabilityService {
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl SlotAvailabilityService {
    pub fn new(doctors: Arc<dyn DoctorStore>, appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { doctors, appointments }
    }

    /// Sorted by start. A day without templates yields an empty list, and past
    /// dates are computed like any other.
    pub async fn compute_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, AppointmentError> {
        let weekday = day_of_week(date);
        let templates = self.doctors.list_active_templates(doctor_id, weekday).await?;

        if templates.is_empty() {
            debug!("Doctor {} has no availability on weekday {}", doctor_id, weekday);
            return Ok(Vec::new());
        }

        let candidates = candidate_slots(templates.iter().map(|t| (t.start_time, t.end_time)));

        let booked: Vec<_> = self
            .appointments
            .list_non_cancelled_appointments(doctor_id, date)
            .await?
            .into_iter()
            .filter(|a| a.holds_slot())
            .map(|a| (a.start_time, a.end_time))
            .collect();

        let available = subtract_booked(candidates, &booked);
        debug!(
            "Doctor {} on {}: {} open slots, {} booked intervals",
            doctor_id,
            date,
            available.len(),
            booked.len()
        );
        Ok(available)
    }
}
