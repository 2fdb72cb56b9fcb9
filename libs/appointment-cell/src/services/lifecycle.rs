use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::store::DoctorStore;
use notification_cell::NotificationSender;
use shared_database::StoreError;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, Participant};
use crate::services::booking::today;
use crate::services::locks::SlotLocks;
use crate::services::notices::Notices;
use crate::store::AppointmentStore;

pub struct AppointmentLifecycleService {
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationSender>,
    locks: Arc<SlotLocks>,
}

impl AppointmentLifecycleService {
    pub fn new(
        doctors: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn NotificationSender>,
        locks: Arc<SlotLocks>,
    ) -> Self {
        Self {
            doctors,
            appointments,
            notifier,
            locks,
        }
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !Self::get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => vec![],
        }
    }

    /// Patient or doctor cancels. The reason is appended to the notes and the
    /// other party is told.
    pub async fn cancel(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
        reason: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let appointment = self.load(appointment_id).await?;
        let actor = participant(&appointment, actor_id)?;
        Self::validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

        if appointment.appointment_date < today() {
            return Err(AppointmentError::PastDateViolation);
        }

        let reason = match reason.trim() {
            "" => "no reason given",
            given => given,
        };
        let note = format!("Cancelled by {}: {}", actor, reason);

        let cancelled = self
            .transition(&appointment, AppointmentStatus::Cancelled, Some(note))
            .await?;

        let notices = self.notices();
        let parties = notices.parties(&cancelled).await;
        let (recipient, message) = match actor {
            Participant::Patient => (
                cancelled.doctor_id,
                format!(
                    "{} cancelled the appointment on {} at {}. Reason: {}",
                    parties.patient,
                    cancelled.appointment_date,
                    cancelled.slot(),
                    reason
                ),
            ),
            Participant::Doctor => (
                cancelled.patient_id,
                format!(
                    "{} cancelled your appointment on {} at {}. Reason: {}",
                    parties.doctor,
                    cancelled.appointment_date,
                    cancelled.slot(),
                    reason
                ),
            ),
        };
        notices.send(recipient, "Appointment cancelled", &message).await;

        info!("Appointment {} cancelled by {}", appointment_id, actor);
        Ok(cancelled)
    }

    /// Doctor marks the consultation as held.
    pub async fn complete(&self, actor_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Completing appointment: {}", appointment_id);

        let appointment = self.load(appointment_id).await?;
        require_doctor(&appointment, actor_id)?;
        Self::validate_status_transition(appointment.status, AppointmentStatus::Completed)?;

        let completed = self
            .transition(&appointment, AppointmentStatus::Completed, None)
            .await?;

        let notices = self.notices();
        let parties = notices.parties(&completed).await;
        notices
            .send(
                completed.patient_id,
                "Appointment completed",
                &format!(
                    "{} marked your appointment on {} as completed.",
                    parties.doctor, completed.appointment_date
                ),
            )
            .await;

        info!("Appointment {} completed", appointment_id);
        Ok(completed)
    }

    /// Doctor accepts a pending request. The slot is re-checked against every
    /// other live booking of that day under the same lock booking uses.
    pub async fn confirm(&self, actor_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Confirming appointment: {}", appointment_id);

        let appointment = self.load(appointment_id).await?;
        require_doctor(&appointment, actor_id)?;
        Self::validate_status_transition(appointment.status, AppointmentStatus::Confirmed)?;

        let confirmed = {
            let _guard = self
                .locks
                .acquire(appointment.doctor_id, appointment.appointment_date)
                .await;

            let clash = self
                .appointments
                .list_non_cancelled_appointments(appointment.doctor_id, appointment.appointment_date)
                .await?
                .iter()
                .any(|other| {
                    other.id != appointment.id
                        && other.holds_slot()
                        && other.overlaps(appointment.start_time, appointment.end_time)
                });

            if clash {
                warn!("Appointment {} overlaps another live booking", appointment_id);
                return Err(AppointmentError::SlotUnavailable);
            }

            self.transition(&appointment, AppointmentStatus::Confirmed, None)
                .await?
        };

        let notices = self.notices();
        let parties = notices.parties(&confirmed).await;
        notices
            .send(
                confirmed.patient_id,
                "Appointment confirmed",
                &format!(
                    "{} confirmed your appointment on {} at {}.",
                    parties.doctor,
                    confirmed.appointment_date,
                    confirmed.slot()
                ),
            )
            .await;

        info!("Appointment {} confirmed", appointment_id);
        Ok(confirmed)
    }

    /// Writes `to` only if the row still has the status it was validated in.
    /// Losing a race to another transition reports the status the row moved to.
    async fn transition(
        &self,
        appointment: &Appointment,
        to: AppointmentStatus,
        note: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        match self
            .appointments
            .update_appointment_status(appointment.id, appointment.status, to, note)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(StoreError::Conflict(reason)) => {
                warn!("Transition of {} to {} lost a race: {}", appointment.id, to, reason);
                let current = self.load(appointment.id).await?;
                Err(AppointmentError::InvalidStatusTransition {
                    from: current.status,
                    to,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    fn notices(&self) -> Notices {
        Notices::new(self.notifier.clone(), self.doctors.clone(), self.appointments.clone())
    }
}

fn participant(appointment: &Appointment, actor_id: Uuid) -> Result<Participant, AppointmentError> {
    if appointment.patient_id == actor_id {
        Ok(Participant::Patient)
    } else if appointment.doctor_id == actor_id {
        Ok(Participant::Doctor)
    } else {
        warn!("User {} is not a participant of appointment {}", actor_id, appointment.id);
        Err(AppointmentError::OwnershipViolation)
    }
}

fn require_doctor(appointment: &Appointment, actor_id: Uuid) -> Result<(), AppointmentError> {
    match participant(appointment, actor_id)? {
        Participant::Doctor => Ok(()),
        Participant::Patient => {
            warn!("Patient {} attempted a doctor-only transition on {}", actor_id, appointment.id);
            Err(AppointmentError::OwnershipViolation)
        }
    }
}
