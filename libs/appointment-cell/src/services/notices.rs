use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::store::DoctorStore;
use notification_cell::NotificationSender;

use crate::models::Appointment;
use crate::store::AppointmentStore;

/// Best-effort side effects of booking events. Failures are logged, never returned.
pub(crate) struct Notices {
    sender: Arc<dyn NotificationSender>,
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
}

/// Display names of both parties of an appointment.
pub(crate) struct Parties {
    pub doctor: String,
    pub patient: String,
}

impl Notices {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        doctors: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
    ) -> Self {
        Self { sender, doctors, appointments }
    }

    pub async fn send(&self, user_id: Uuid, title: &str, message: &str) {
        match self.sender.notify(user_id, title, message).await {
            Ok(()) => debug!("Notified {}: {}", user_id, title),
            Err(e) => warn!("Notification '{}' to {} failed: {}", title, user_id, e),
        }
    }

    pub async fn parties(&self, appointment: &Appointment) -> Parties {
        let doctor = match self.doctors.get_doctor(appointment.doctor_id).await {
            Ok(Some(doctor)) => doctor.display_name(),
            Ok(None) => "your doctor".to_string(),
            Err(e) => {
                warn!("Could not load doctor {} for notification: {}", appointment.doctor_id, e);
                "your doctor".to_string()
            }
        };

        let patient = match self.appointments.get_patient(appointment.patient_id).await {
            Ok(Some(patient)) => patient.full_name(),
            Ok(None) => "your patient".to_string(),
            Err(e) => {
                warn!("Could not load patient {} for notification: {}", appointment.patient_id, e);
                "your patient".to_string()
            }
        };

        Parties { doctor, patient }
    }
}
