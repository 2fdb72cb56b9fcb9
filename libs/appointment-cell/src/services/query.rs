use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};
use crate::store::AppointmentStore;

pub struct AppointmentQueryService {
    appointments: Arc<dyn AppointmentStore>,
}

impl AppointmentQueryService {
    pub fn new(appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { appointments }
    }

    /// Visible to its two participants and to admins.
    pub async fn get_appointment(
        &self,
        actor_id: Uuid,
        is_admin: bool,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let appointment = self
            .appointments
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if !is_admin && !appointment.is_participant(actor_id) {
            warn!("User {} attempted to read appointment {}", actor_id, appointment_id);
            return Err(AppointmentError::OwnershipViolation);
        }

        Ok(appointment)
    }

    pub async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for patient: {}", patient_id);
        Ok(self.appointments.list_patient_appointments(patient_id).await?)
    }

    pub async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for doctor: {}", doctor_id);
        Ok(self.appointments.list_doctor_appointments(doctor_id).await?)
    }
}
