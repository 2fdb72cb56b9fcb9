use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::StoreError;

use super::{append_note, AppointmentStore};
use crate::models::{Appointment, AppointmentStatus, NewAppointment, PatientProfile};

/// Process-local store. The overlap check runs under the write lock, which is
/// what the Postgres exclusion constraint does for the Supabase backend.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    patients: RwLock<HashMap<Uuid, PatientProfile>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_patient(&self, patient: PatientProfile) {
        self.patients.write().await.insert(patient.id, patient);
    }

    /// Stores a row verbatim, bypassing the overlap check. Used to load history.
    pub async fn insert_unchecked(&self, appointment: Appointment) {
        self.appointments.write().await.insert(appointment.id, appointment);
    }

    async fn sorted<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut found: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.appointment_date, a.start_time));
        found
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list_non_cancelled_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .sorted(|a| a.doctor_id == doctor_id && a.appointment_date == date && a.holds_slot())
            .await)
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;

        let clash = appointments.values().any(|existing| {
            existing.doctor_id == appointment.doctor_id
                && existing.appointment_date == appointment.appointment_date
                && existing.holds_slot()
                && existing.overlaps(appointment.start_time, appointment.end_time)
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "doctor {} already booked on {} at {}",
                appointment.doctor_id,
                appointment.appointment_date,
                appointment.start_time.format("%H:%M")
            )));
        }

        let now = Utc::now();
        let stored = Appointment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: AppointmentStatus::Pending,
            reason: appointment.reason,
            notes: appointment.notes,
            created_at: now,
            updated_at: now,
        };
        appointments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        notes_append: Option<String>,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment_id)))?;

        if appointment.status != expected {
            return Err(StoreError::Conflict(format!(
                "appointment {} is {}, expected {}",
                appointment_id, appointment.status, expected
            )));
        }

        appointment.status = status;
        appointment.notes = append_note(appointment.notes.take(), notes_append);
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.sorted(|a| a.patient_id == patient_id).await)
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.sorted(|a| a.doctor_id == doctor_id).await)
    }

    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>, StoreError> {
        Ok(self.patients.read().await.get(&patient_id).cloned())
    }
}
