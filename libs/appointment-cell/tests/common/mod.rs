#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, BookAppointmentRequest, PatientProfile};
use appointment_cell::router::AppointmentCellState;
use appointment_cell::store::InMemoryAppointmentStore;
use doctor_cell::models::{AvailabilityTemplate, Doctor};
use doctor_cell::store::InMemoryDoctorStore;
use notification_cell::{InboxNotifier, InMemoryNotificationStore, NotificationSender};
use shared_utils::test_utils::TestConfig;

pub struct Fixture {
    pub config: TestConfig,
    pub doctors: Arc<InMemoryDoctorStore>,
    pub appointments: Arc<InMemoryAppointmentStore>,
    pub inbox: Arc<InMemoryNotificationStore>,
    pub state: AppointmentCellState,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

impl Fixture {
    /// One verified doctor and one patient, notifications written to an in-memory inbox.
    pub async fn new() -> Self {
        let inbox = Arc::new(InMemoryNotificationStore::new());
        let notifier: Arc<dyn NotificationSender> = Arc::new(InboxNotifier::new(inbox.clone()));
        Self::with_notifier(inbox, notifier).await
    }

    pub async fn with_notifier(
        inbox: Arc<InMemoryNotificationStore>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let config = TestConfig::default();
        let doctors = Arc::new(InMemoryDoctorStore::new());
        let appointments = Arc::new(InMemoryAppointmentStore::new());

        let doctor_id = Uuid::new_v4();
        doctors.upsert_doctor(doctor(doctor_id, true)).await;

        let patient_id = Uuid::new_v4();
        appointments.upsert_patient(patient(patient_id, "Jane")).await;

        let state = AppointmentCellState::new(config.to_arc(), doctors.clone(), appointments.clone(), notifier);

        Self {
            config,
            doctors,
            appointments,
            inbox,
            state,
            doctor_id,
            patient_id,
        }
    }

    pub async fn add_template(&self, day_of_week: u8, start: &str, end: &str) {
        self.doctors
            .insert_template_unchecked(AvailabilityTemplate {
                id: Uuid::new_v4(),
                doctor_id: self.doctor_id,
                day_of_week,
                start_time: time(start),
                end_time: time(end),
                is_active: true,
                created_at: Utc::now(),
            })
            .await;
    }

    pub async fn add_patient(&self, first_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.appointments.upsert_patient(patient(id, first_name)).await;
        id
    }

    pub fn request(&self, date: NaiveDate, slot: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: self.doctor_id,
            date,
            slot: slot.to_string(),
            reason: Some("Persistent cough".to_string()),
            notes: None,
        }
    }

    /// A row written directly, e.g. for dates the booking path refuses.
    pub async fn seed_appointment(&self, date: NaiveDate, start: &str, end: &str, status: AppointmentStatus) -> Appointment {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            appointment_date: date,
            start_time: time(start),
            end_time: time(end),
            status,
            reason: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.appointments.insert_unchecked(appointment.clone()).await;
        appointment
    }
}

pub fn doctor(id: Uuid, verified: bool) -> Doctor {
    Doctor {
        id,
        first_name: "Amina".to_string(),
        last_name: "Otieno".to_string(),
        email: "amina@example.com".to_string(),
        specialty: "General Practice".to_string(),
        location: Some("Nairobi".to_string()),
        languages: vec!["English".to_string()],
        consultation_fee: Some(30.0),
        bio: None,
        is_verified: verified,
        created_at: Utc::now(),
    }
}

pub fn patient(id: Uuid, first_name: &str) -> PatientProfile {
    PatientProfile {
        id,
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
    }
}

pub fn time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap()
}

/// A Monday at least a week away, so date guards never trip.
pub fn upcoming_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date = date.succ_opt().unwrap();
    }
    date
}

pub fn labels<T: ToString>(slots: &[T]) -> Vec<String> {
    slots.iter().map(ToString::to_string).collect()
}
