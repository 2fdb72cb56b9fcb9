use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::DoctorService;
use doctor_cell::store::DoctorStore;
use notification_cell::NotificationSender;

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, NewAppointment};
use crate::services::availability::SlotAvailabilityService;
use crate::services::locks::SlotLocks;
use crate::services::notices::Notices;
use crate::services::slots::parse_slot;
use crate::store::AppointmentStore;

pub struct BookingService {
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationSender>,
    locks: Arc<SlotLocks>,
}

impl BookingService {
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

    /// Book `request.slot` for the patient. The slot must be among the doctor's
    /// open slots at the moment of insertion; the new row starts `pending`.
    pub async fn validate_and_book(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking {} on {} with doctor {} for patient {}",
            request.slot, request.date, request.doctor_id, patient_id
        );

        // **Step 1: Input and party validation, before anything is written**
        let slot = parse_slot(&request.slot)?;

        if request.date < today() {
            return Err(AppointmentError::PastDateViolation);
        }

        let doctor = DoctorService::new(self.doctors.clone())
            .get_verified_doctor(request.doctor_id)
            .await?;

        let patient = self
            .appointments
            .get_patient(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        // **Step 2: Recompute and insert under the (doctor, date) lock**
        let appointment = {
            let _guard = self.locks.acquire(doctor.id, request.date).await;

            let available = SlotAvailabilityService::new(self.doctors.clone(), self.appointments.clone())
                .compute_available_slots(doctor.id, request.date)
                .await?;

            if !available.contains(&slot) {
                warn!("Slot {} on {} is not open for doctor {}", slot, request.date, doctor.id);
                return Err(AppointmentError::SlotUnavailable);
            }

            self.appointments
                .insert_appointment(NewAppointment {
                    patient_id,
                    doctor_id: doctor.id,
                    appointment_date: request.date,
                    start_time: slot.start,
                    end_time: slot.end,
                    reason: request.reason.filter(|r| !r.trim().is_empty()),
                    notes: request.notes.filter(|n| !n.trim().is_empty()),
                })
                .await
                .map_err(|e| {
                    if e.is_conflict() {
                        warn!("Store rejected overlapping booking for doctor {}: {}", doctor.id, e);
                        AppointmentError::SlotUnavailable
                    } else {
                        e.into()
                    }
                })?
        };

        // **Step 3: Post-booking notifications**
        let notices = Notices::new(self.notifier.clone(), self.doctors.clone(), self.appointments.clone());
        notices
            .send(
                patient.id,
                "Appointment requested",
                &format!(
                    "Your appointment with {} on {} at {} is awaiting confirmation.",
                    doctor.display_name(),
                    appointment.appointment_date,
                    slot
                ),
            )
            .await;
        notices
            .send(
                doctor.id,
                "New appointment request",
                &format!(
                    "{} requested an appointment on {} at {}.",
                    patient.full_name(),
                    appointment.appointment_date,
                    slot
                ),
            )
            .await;

        info!("Appointment {} booked with doctor {}", appointment.id, doctor.id);
        debug!("Booked appointment: {:?}", appointment);
        Ok(appointment)
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
