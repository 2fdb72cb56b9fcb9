mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use mockall::mock;
use tokio::sync::Barrier;
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentStatus, NewAppointment, PatientProfile,
};
use appointment_cell::services::AppointmentLifecycleService;
use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore};
use common::{upcoming_monday, Fixture};
use notification_cell::{InMemoryNotificationStore, NotificationError, NotificationSender, NotificationStore};
use shared_database::StoreError;

mock! {
    pub Sender {}

    #[async_trait]
    impl NotificationSender for Sender {
        async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<(), NotificationError>;
    }
}

/// Parks the first two appointment reads until both have arrived, so two
/// transitions validate the same status before either one writes.
struct LockstepReads {
    inner: Arc<InMemoryAppointmentStore>,
    barrier: Barrier,
    reads: AtomicUsize,
}

impl LockstepReads {
    fn new(inner: Arc<InMemoryAppointmentStore>) -> Self {
        Self {
            inner,
            barrier: Barrier::new(2),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AppointmentStore for LockstepReads {
    async fn list_non_cancelled_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.inner.list_non_cancelled_appointments(doctor_id, date).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        self.inner.insert_appointment(appointment).await
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        notes_append: Option<String>,
    ) -> Result<Appointment, StoreError> {
        self.inner
            .update_appointment_status(appointment_id, expected, status, notes_append)
            .await
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let read = self.inner.get_appointment(appointment_id).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait().await;
        }
        read
    }

    async fn list_patient_appointments(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        self.inner.list_patient_appointments(patient_id).await
    }

    async fn list_doctor_appointments(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        self.inner.list_doctor_appointments(doctor_id).await
    }

    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<PatientProfile>, StoreError> {
        self.inner.get_patient(patient_id).await
    }
}

fn lockstep_lifecycle(fx: &Fixture) -> AppointmentLifecycleService {
    AppointmentLifecycleService::new(
        fx.state.doctors.clone(),
        Arc::new(LockstepReads::new(fx.appointments.clone())),
        fx.state.notifier.clone(),
        fx.state.locks.clone(),
    )
}

async fn booked(fx: &Fixture) -> appointment_cell::models::Appointment {
    fx.add_template(0, "09:00", "10:00").await;
    fx.state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "09:00 - 09:30"))
        .await
        .unwrap()
}

#[tokio::test]
async fn patient_cancel_records_reason_and_tells_the_doctor() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;
    let doctor_inbox_before = fx.inbox.list_for_user(fx.doctor_id).await.unwrap().len();

    let cancelled = fx
        .state
        .lifecycle_service()
        .cancel(fx.patient_id, appointment.id, "Travelling")
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.notes.as_deref(), Some("Cancelled by patient: Travelling"));

    let doctor_inbox = fx.inbox.list_for_user(fx.doctor_id).await.unwrap();
    assert_eq!(doctor_inbox.len(), doctor_inbox_before + 1);
    assert_eq!(doctor_inbox[0].title, "Appointment cancelled");
    assert!(doctor_inbox[0].message.contains("Jane Doe"));
    assert!(doctor_inbox[0].message.contains(&upcoming_monday().to_string()));
    assert!(doctor_inbox[0].message.contains("Travelling"));
}

#[tokio::test]
async fn doctor_cancel_tells_the_patient() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;

    let cancelled = fx
        .state
        .lifecycle_service()
        .cancel(fx.doctor_id, appointment.id, "Conference")
        .await
        .unwrap();
    assert_eq!(cancelled.notes.as_deref(), Some("Cancelled by doctor: Conference"));

    let patient_inbox = fx.inbox.list_for_user(fx.patient_id).await.unwrap();
    assert_eq!(patient_inbox[0].title, "Appointment cancelled");
    assert!(patient_inbox[0].message.contains("Dr. Amina Otieno"));
}

#[tokio::test]
async fn cancel_keeps_existing_notes() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    let mut request = fx.request(upcoming_monday(), "09:30 - 10:00");
    request.notes = Some("Bring lab results".to_string());
    let appointment = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, request)
        .await
        .unwrap();

    let cancelled = fx
        .state
        .lifecycle_service()
        .cancel(fx.patient_id, appointment.id, "")
        .await
        .unwrap();

    assert_eq!(
        cancelled.notes.as_deref(),
        Some("Bring lab results\nCancelled by patient: no reason given")
    );
}

#[tokio::test]
async fn past_appointments_cannot_be_cancelled() {
    let fx = Fixture::new().await;
    let last_week = Utc::now().date_naive() - Duration::days(7);
    let appointment = fx
        .seed_appointment(last_week, "09:00", "09:30", AppointmentStatus::Confirmed)
        .await;

    let result = fx
        .state
        .lifecycle_service()
        .cancel(fx.patient_id, appointment.id, "Too late")
        .await;
    assert_matches!(result, Err(AppointmentError::PastDateViolation));

    let result = fx
        .state
        .lifecycle_service()
        .cancel(fx.doctor_id, appointment.id, "Too late")
        .await;
    assert_matches!(result, Err(AppointmentError::PastDateViolation));

    let unchanged = fx.appointments.get_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn strangers_cannot_touch_an_appointment() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;
    let stranger = Uuid::new_v4();
    let lifecycle = fx.state.lifecycle_service();

    assert_matches!(
        lifecycle.cancel(stranger, appointment.id, "x").await,
        Err(AppointmentError::OwnershipViolation)
    );
    assert_matches!(
        lifecycle.confirm(stranger, appointment.id).await,
        Err(AppointmentError::OwnershipViolation)
    );
    assert_matches!(
        lifecycle.complete(stranger, appointment.id).await,
        Err(AppointmentError::OwnershipViolation)
    );
}

#[tokio::test]
async fn only_the_doctor_confirms_or_completes() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;
    let lifecycle = fx.state.lifecycle_service();

    assert_matches!(
        lifecycle.confirm(fx.patient_id, appointment.id).await,
        Err(AppointmentError::OwnershipViolation)
    );
    assert_matches!(
        lifecycle.complete(fx.patient_id, appointment.id).await,
        Err(AppointmentError::OwnershipViolation)
    );

    let confirmed = lifecycle.confirm(fx.doctor_id, appointment.id).await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let completed = lifecycle.complete(fx.doctor_id, appointment.id).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let patient_inbox = fx.inbox.list_for_user(fx.patient_id).await.unwrap();
    let titles: Vec<&str> = patient_inbox.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Appointment completed", "Appointment confirmed", "Appointment requested"]
    );
}

#[tokio::test]
async fn terminal_states_reject_further_transitions() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;
    let lifecycle = fx.state.lifecycle_service();

    lifecycle.cancel(fx.patient_id, appointment.id, "Changed plans").await.unwrap();

    assert_matches!(
        lifecycle.confirm(fx.doctor_id, appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition { from: AppointmentStatus::Cancelled, .. })
    );
    assert_matches!(
        lifecycle.complete(fx.doctor_id, appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        lifecycle.cancel(fx.patient_id, appointment.id, "again").await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn confirm_rejects_a_row_that_overlaps_another_live_booking() {
    let fx = Fixture::new().await;
    let monday = upcoming_monday();
    fx.seed_appointment(monday, "09:00", "09:30", AppointmentStatus::Confirmed).await;
    let legacy = fx
        .seed_appointment(monday, "09:15", "09:45", AppointmentStatus::Pending)
        .await;

    let result = fx.state.lifecycle_service().confirm(fx.doctor_id, legacy.id).await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let fx = Fixture::new().await;
    assert_matches!(
        fx.state.lifecycle_service().confirm(fx.doctor_id, Uuid::new_v4()).await,
        Err(AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn notification_failure_does_not_undo_the_transition() {
    let mut sender = MockSender::new();
    sender
        .expect_notify()
        .returning(|_, _, _| Err(NotificationError::Delivery("mail relay down".to_string())));

    let inbox = Arc::new(InMemoryNotificationStore::new());
    let fx = Fixture::with_notifier(inbox, Arc::new(sender)).await;
    let appointment = booked(&fx).await;

    let cancelled = fx
        .state
        .lifecycle_service()
        .cancel(fx.patient_id, appointment.id, "Sick")
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let stored = fx.appointments.get_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn each_transition_sends_exactly_one_counterparty_notice() {
    let fx = Fixture::new().await;
    let appointment = booked(&fx).await;

    let doctor_id = fx.doctor_id;
    let mut sender = MockSender::new();
    sender
        .expect_notify()
        .withf(move |user_id, title, _message| *user_id == doctor_id && title.to_string() == "Appointment cancelled")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let lifecycle = AppointmentLifecycleService::new(
        fx.state.doctors.clone(),
        fx.state.appointments.clone(),
        Arc::new(sender),
        fx.state.locks.clone(),
    );
    lifecycle.cancel(fx.patient_id, appointment.id, "Busy").await.unwrap();
}

#[tokio::test]
async fn racing_complete_and_cancel_settle_on_one_outcome() {
    let fx = Fixture::new().await;
    let appointment = fx
        .seed_appointment(upcoming_monday(), "09:00", "09:30", AppointmentStatus::Confirmed)
        .await;
    let lifecycle = lockstep_lifecycle(&fx);

    let (completed, cancelled) = tokio::join!(
        lifecycle.complete(fx.doctor_id, appointment.id),
        lifecycle.cancel(fx.patient_id, appointment.id, "ill"),
    );

    let stored = fx.appointments.get_appointment(appointment.id).await.unwrap().unwrap();
    match (completed, cancelled) {
        (Ok(done), Err(lost)) => {
            assert_eq!(done.status, AppointmentStatus::Completed);
            assert_matches!(
                lost,
                AppointmentError::InvalidStatusTransition { from: AppointmentStatus::Completed, .. }
            );
            assert_eq!(stored.status, AppointmentStatus::Completed);
            assert_eq!(stored.notes, None);
        }
        (Err(lost), Ok(done)) => {
            assert_eq!(done.status, AppointmentStatus::Cancelled);
            assert_matches!(
                lost,
                AppointmentError::InvalidStatusTransition { from: AppointmentStatus::Cancelled, .. }
            );
            assert_eq!(stored.status, AppointmentStatus::Cancelled);
        }
        (left, right) => panic!("expected exactly one winner, got {:?} and {:?}", left, right),
    }

    // Only the winning transition tells its counterparty.
    assert_eq!(fx.inbox.len().await, 1);
}

#[tokio::test]
async fn confirm_cannot_revive_a_concurrently_cancelled_request() {
    let fx = Fixture::new().await;
    let appointment = fx
        .seed_appointment(upcoming_monday(), "10:00", "10:30", AppointmentStatus::Pending)
        .await;
    let lifecycle = lockstep_lifecycle(&fx);

    let (confirmed, cancelled) = tokio::join!(
        lifecycle.confirm(fx.doctor_id, appointment.id),
        lifecycle.cancel(fx.patient_id, appointment.id, "Found another clinic"),
    );

    assert_eq!(confirmed.is_ok() as u8 + cancelled.is_ok() as u8, 1);

    let stored = fx.appointments.get_appointment(appointment.id).await.unwrap().unwrap();
    if cancelled.is_ok() {
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.notes.as_deref(), Some("Cancelled by patient: Found another clinic"));
    } else {
        assert_eq!(stored.status, AppointmentStatus::Confirmed);
    }
    assert_eq!(fx.inbox.len().await, 1);
}
