mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Duration, Utc};
use futures::future::join_all;

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use appointment_cell::services::parse_slot;
use appointment_cell::store::AppointmentStore;
use common::{doctor, labels, upcoming_monday, Fixture};
use doctor_cell::store::DoctorStore;
use notification_cell::NotificationStore;

#[tokio::test]
async fn monday_hour_tiles_into_two_slots() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, upcoming_monday())
        .await
        .unwrap();

    assert_eq!(labels(&slots), vec!["09:00 - 09:30", "09:30 - 10:00"]);
}

#[tokio::test]
async fn booking_removes_slot_and_rebooking_fails() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    let monday = upcoming_monday();

    let appointment = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(monday, "09:00 - 09:30"))
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.end_time, common::time("09:30"));

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, monday)
        .await
        .unwrap();
    assert_eq!(labels(&slots), vec!["09:30 - 10:00"]);

    let other = fx.add_patient("Otto").await;
    let result = fx
        .state
        .booking_service()
        .validate_and_book(other, fx.request(monday, "09:00 - 09:30"))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

#[tokio::test]
async fn cancelling_frees_the_slot_again() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    let monday = upcoming_monday();

    let appointment = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(monday, "09:30 - 10:00"))
        .await
        .unwrap();

    fx.state
        .lifecycle_service()
        .cancel(fx.patient_id, appointment.id, "Feeling better")
        .await
        .unwrap();

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, monday)
        .await
        .unwrap();
    assert_eq!(labels(&slots), vec!["09:00 - 09:30", "09:30 - 10:00"]);

    assert!(fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(monday, "09:30 - 10:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn short_template_yields_one_clipped_slot_that_can_be_booked() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "09:10").await;
    let monday = upcoming_monday();

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, monday)
        .await
        .unwrap();
    assert_eq!(labels(&slots), vec!["09:00 - 09:10"]);

    let appointment = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(monday, "09:00 - 09:10"))
        .await
        .unwrap();
    assert_eq!(appointment.end_time, common::time("09:10"));
}

#[tokio::test]
async fn day_without_templates_is_empty_not_an_error() {
    let fx = Fixture::new().await;
    fx.add_template(1, "09:00", "17:00").await;

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, upcoming_monday())
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn inactive_templates_are_ignored() {
    let fx = Fixture::new().await;
    fx.doctors
        .insert_template_unchecked(doctor_cell::models::AvailabilityTemplate {
            id: uuid::Uuid::new_v4(),
            doctor_id: fx.doctor_id,
            day_of_week: 0,
            start_time: common::time("09:00"),
            end_time: common::time("10:00"),
            is_active: false,
            created_at: Utc::now(),
        })
        .await;

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, upcoming_monday())
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn recomputation_is_idempotent() {
    let fx = Fixture::new().await;
    fx.add_template(0, "08:00", "12:00").await;
    fx.add_template(0, "14:00", "15:45").await;
    let monday = upcoming_monday();
    fx.seed_appointment(monday, "08:30", "09:15", AppointmentStatus::Confirmed).await;

    let service = fx.state.availability_service();
    let first = service.compute_available_slots(fx.doctor_id, monday).await.unwrap();
    let second = service.compute_available_slots(fx.doctor_id, monday).await.unwrap();

    assert_eq!(first, second);
    assert!(!labels(&first).contains(&"09:00 - 09:30".to_string()));
    assert_eq!(labels(&first).last().unwrap(), "15:30 - 15:45");
    for slot in &first {
        assert_eq!(&parse_slot(&slot.to_string()).unwrap(), slot);
    }
}

#[tokio::test]
async fn overlapping_templates_do_not_duplicate_slots() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    fx.add_template(0, "09:00", "10:00").await;

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, upcoming_monday())
        .await
        .unwrap();
    assert_eq!(labels(&slots), vec!["09:00 - 09:30", "09:30 - 10:00"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_of_one_slot_admit_exactly_one() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    let monday = upcoming_monday();

    let mut patients = vec![fx.patient_id];
    for name in ["Ann", "Ben", "Cid", "Dee", "Eve", "Fay", "Gus"] {
        patients.push(fx.add_patient(name).await);
    }

    let booking = Arc::new(fx.state.booking_service());
    let attempts = patients.into_iter().map(|patient_id| {
        let booking = booking.clone();
        let request = fx.request(monday, "09:00 - 09:30");
        tokio::spawn(async move { booking.validate_and_book(patient_id, request).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == AppointmentError::SlotUnavailable));

    let live = fx
        .appointments
        .list_non_cancelled_appointments(fx.doctor_id, monday)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);
}

#[tokio::test]
async fn booking_notifies_patient_and_doctor() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;

    fx.state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "09:00 - 09:30"))
        .await
        .unwrap();

    let patient_inbox = fx.inbox.list_for_user(fx.patient_id).await.unwrap();
    assert_eq!(patient_inbox.len(), 1);
    assert!(patient_inbox[0].message.contains("Dr. Amina Otieno"));

    let doctor_inbox = fx.inbox.list_for_user(fx.doctor_id).await.unwrap();
    assert_eq!(doctor_inbox.len(), 1);
    assert!(doctor_inbox[0].message.contains("Jane Doe"));
    assert!(doctor_inbox[0].message.contains("09:00 - 09:30"));
}

#[tokio::test]
async fn malformed_label_is_rejected_before_any_write() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;

    let result = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "9-9:30"))
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidTimeRange(_)));
    assert!(fx.appointments.list_doctor_appointments(fx.doctor_id).await.unwrap().is_empty());
    assert!(fx.inbox.is_empty().await);
}

#[tokio::test]
async fn slot_outside_any_template_is_unavailable() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;

    let result = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "10:00 - 10:30"))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));

    // Inside the window but not on the slot grid.
    let result = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "09:15 - 09:45"))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable));
}

#[tokio::test]
async fn unverified_or_unknown_doctor_cannot_be_booked() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    fx.doctors.upsert_doctor(doctor(fx.doctor_id, false)).await;

    let result = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(upcoming_monday(), "09:00 - 09:30"))
        .await;
    assert_matches!(result, Err(AppointmentError::DoctorNotFound));

    let mut request = fx.request(upcoming_monday(), "09:00 - 09:30");
    request.doctor_id = uuid::Uuid::new_v4();
    let result = fx.state.booking_service().validate_and_book(fx.patient_id, request).await;
    assert_matches!(result, Err(AppointmentError::DoctorNotFound));
}

#[tokio::test]
async fn caller_without_patient_profile_cannot_book() {
    let fx = Fixture::new().await;
    fx.add_template(0, "09:00", "10:00").await;
    assert!(fx.doctors.get_doctor(fx.doctor_id).await.unwrap().is_some());

    let result = fx
        .state
        .booking_service()
        .validate_and_book(uuid::Uuid::new_v4(), fx.request(upcoming_monday(), "09:00 - 09:30"))
        .await;
    assert_matches!(result, Err(AppointmentError::PatientNotFound));
}

#[tokio::test]
async fn past_dates_cannot_be_booked_but_can_be_queried() {
    let fx = Fixture::new().await;
    for day in 0..7 {
        fx.add_template(day, "09:00", "10:00").await;
    }
    let yesterday = Utc::now().date_naive() - Duration::days(1);

    let slots = fx
        .state
        .availability_service()
        .compute_available_slots(fx.doctor_id, yesterday)
        .await
        .unwrap();
    assert_eq!(slots.len(), 2);

    let result = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(yesterday, "09:00 - 09:30"))
        .await;
    assert_matches!(result, Err(AppointmentError::PastDateViolation));
}

#[tokio::test]
async fn past_date_guard_is_per_day_not_per_slot() {
    let fx = Fixture::new().await;
    let today = Utc::now().date_naive();
    fx.add_template(today.weekday().num_days_from_monday() as u8, "00:00", "00:30").await;

    // Times carry no zone, so an earlier slot on the current date is still accepted.
    let appointment = fx
        .state
        .booking_service()
        .validate_and_book(fx.patient_id, fx.request(today, "00:00 - 00:30"))
        .await
        .unwrap();
    assert_eq!(appointment.appointment_date, today);
}
