use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoreError, SupabaseClient};

use super::{append_note, AppointmentStore};
use crate::models::{Appointment, AppointmentStatus, NewAppointment, PatientProfile};

const APPOINTMENTS: &str = "/rest/v1/appointments";
const PATIENTS: &str = "/rest/v1/patients";

/// PostgREST-backed store. Double-booking across processes is prevented by the
/// `appointments_no_overlap` exclusion constraint, which PostgREST reports as 409.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(self.supabase.service_token()), None)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn write(&self, method: Method, path: &str, body: Value) -> Result<Option<Appointment>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                method,
                path,
                Some(self.supabase.service_token()),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .transpose()
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn list_non_cancelled_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "{}?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled&order=start_time.asc",
            APPOINTMENTS, doctor_id, date
        );
        self.fetch(&path).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        debug!(
            "Inserting appointment for doctor {} on {} at {}",
            appointment.doctor_id, appointment.appointment_date, appointment.start_time
        );

        let body = json!({
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "appointment_date": appointment.appointment_date,
            "start_time": appointment.start_time.format("%H:%M:%S").to_string(),
            "end_time": appointment.end_time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Pending,
            "reason": appointment.reason,
            "notes": appointment.notes
        });

        self.write(Method::POST, APPOINTMENTS, body)
            .await?
            .ok_or_else(|| StoreError::Backend("insert returned no rows".to_string()))
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        notes_append: Option<String>,
    ) -> Result<Appointment, StoreError> {
        let mut path = format!("{}?id=eq.{}&status=eq.{}", APPOINTMENTS, appointment_id, expected);
        let mut body = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        if notes_append.is_some() {
            let current = self
                .get_appointment(appointment_id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment_id)))?;
            if current.status != expected {
                return Err(moved_on(appointment_id, expected));
            }
            body["notes"] = json!(append_note(current.notes, notes_append));

            // Pin the notes that were read; a concurrent writer makes the PATCH match nothing.
            let read_at = current.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true);
            path.push_str(&format!("&updated_at=eq.{}", urlencoding::encode(&read_at)));
        }

        debug!("Updating appointment {} from {} to {}", appointment_id, expected, status);
        self.write(Method::PATCH, &path, body)
            .await?
            .ok_or_else(|| moved_on(appointment_id, expected))
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, appointment_id);
        Ok(self.fetch::<Appointment>(&path).await?.into_iter().next())
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "{}?patient_id=eq.{}&order=appointment_date.asc,start_time.asc",
            APPOINTMENTS, patient_id
        );
        self.fetch(&path).await
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=appointment_date.asc,start_time.asc",
            APPOINTMENTS, doctor_id
        );
        self.fetch(&path).await
    }

    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>, StoreError> {
        let path = format!("{}?id=eq.{}&select=id,first_name,last_name,email", PATIENTS, patient_id);
        Ok(self.fetch::<PatientProfile>(&path).await?.into_iter().next())
    }
}

fn moved_on(appointment_id: Uuid, expected: AppointmentStatus) -> StoreError {
    StoreError::Conflict(format!("appointment {} is no longer {}", appointment_id, expected))
}
