use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use doctor_cell::{
    AvailabilityService, CreateDoctorRequest, CreateScheduleRequest, DoctorError, DoctorService,
    UpdateScheduleRequest,
};
use reference_cell::{CreateDepartmentRequest, DepartmentService};
use shared_database::ClinicDatabase;
use shared_models::entities::{DayOfWeek, Doctor};

async fn doctor_with_db() -> (ClinicDatabase, Arc<AvailabilityService>, Doctor) {
    let db = ClinicDatabase::new();
    let departments = DepartmentService::new(db.clone());
    let doctors = DoctorService::new(db.clone());
    let availability = Arc::new(AvailabilityService::new(db.clone()));

    let department = departments
        .create_department(CreateDepartmentRequest {
            name: "Dermatology".to_string(),
            head_name: None,
            location: None,
            phone: None,
            description: None,
        })
        .await
        .unwrap();
    let doctor = doctors
        .create_doctor(CreateDoctorRequest {
            first_name: "Sofia".to_string(),
            last_name: "Lindgren".to_string(),
            specialization: "Dermatology".to_string(),
            department_id: department.id,
            email: "s.lindgren@clinic.example".to_string(),
            phone: None,
            license_number: "MD-20931".to_string(),
            consultation_fee: 110.0,
            years_experience: 9,
        })
        .await
        .unwrap();

    (db, availability, doctor)
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn window(start: NaiveTime, end: NaiveTime) -> CreateScheduleRequest {
    CreateScheduleRequest {
        day_of_week: DayOfWeek::Tuesday,
        start_time: start,
        end_time: end,
        max_patients_per_hour: 2,
        is_available: Some(true),
    }
}

fn next_tuesday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != Weekday::Tue {
        date += Duration::days(1);
    }
    date
}

#[tokio::test]
async fn rejects_overlapping_windows_on_same_day() {
    let (_, availability, doctor) = doctor_with_db().await;

    availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();

    // Different start time, overlapping range.
    let result = availability
        .create_schedule(doctor.id, window(time(11, 0), time(14, 0)))
        .await;
    assert_matches!(result, Err(DoctorError::ScheduleOverlap { day: DayOfWeek::Tuesday, .. }));

    // Touching windows do not overlap.
    availability
        .create_schedule(doctor.id, window(time(12, 0), time(14, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn rejects_inverted_and_zero_capacity_windows() {
    let (_, availability, doctor) = doctor_with_db().await;

    let result = availability
        .create_schedule(doctor.id, window(time(12, 0), time(9, 0)))
        .await;
    assert_matches!(result, Err(DoctorError::InvalidTimeRange));

    let mut request = window(time(9, 0), time(12, 0));
    request.max_patients_per_hour = 0;
    let result = availability.create_schedule(doctor.id, request).await;
    assert_matches!(result, Err(DoctorError::ValidationError(_)));
}

#[tokio::test]
async fn windows_are_ordered_by_start_time() {
    let (_, availability, doctor) = doctor_with_db().await;

    availability
        .create_schedule(doctor.id, window(time(14, 0), time(17, 0)))
        .await
        .unwrap();
    availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();

    let windows = availability.windows_for(doctor.id, DayOfWeek::Tuesday).await;
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].start_time, time(9, 0));
    assert_eq!(windows[1].start_time, time(14, 0));
}

#[tokio::test]
async fn window_lookup_requires_full_containment() {
    let (_, availability, doctor) = doctor_with_db().await;

    availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();
    let date = next_tuesday();

    assert!(availability.window_for(doctor.id, date, time(9, 0), 60).await.is_some());
    assert!(availability.is_within_window(doctor.id, date, time(11, 30), 30).await);
    // Runs past the window end.
    assert!(availability.window_for(doctor.id, date, time(11, 45), 30).await.is_none());
    assert!(!availability.is_within_window(doctor.id, date, time(8, 30), 60).await);
}

#[tokio::test]
async fn cached_windows_refresh_after_schedule_update() {
    let (_, availability, doctor) = doctor_with_db().await;

    let schedule = availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();

    // Prime the cache, then shrink the window.
    let date = next_tuesday();
    assert!(availability.window_for(doctor.id, date, time(11, 0), 30).await.is_some());

    availability
        .update_schedule(
            schedule.id,
            UpdateScheduleRequest {
                end_time: Some(time(11, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(availability.window_for(doctor.id, date, time(11, 0), 30).await.is_none());
    assert!(availability.window_for(doctor.id, date, time(10, 0), 30).await.is_some());
}

#[tokio::test]
async fn cache_never_keeps_windows_a_concurrent_write_obsoleted() {
    let (db, availability, doctor) = doctor_with_db().await;
    let schedule = availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();

    // Race a cold-cache read against a schedule write, then check that the
    // cache agrees with the store once both finish.
    for round in 0..50u32 {
        let end = if round % 2 == 0 { time(16, 0) } else { time(12, 0) };

        let reader = {
            let availability = availability.clone();
            let doctor_id = doctor.id;
            tokio::spawn(async move { availability.windows_for(doctor_id, DayOfWeek::Tuesday).await })
        };
        availability
            .update_schedule(
                schedule.id,
                UpdateScheduleRequest {
                    end_time: Some(end),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        reader.await.unwrap();

        let stored = db.schedules_for_doctor_day(doctor.id, DayOfWeek::Tuesday).await;
        let cached = availability.windows_for(doctor.id, DayOfWeek::Tuesday).await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].end_time, stored[0].end_time);
        assert_eq!(cached[0].end_time, end);
    }
}

#[tokio::test]
async fn deleted_schedule_disappears_from_windows() {
    let (_, availability, doctor) = doctor_with_db().await;

    let schedule = availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();
    assert_eq!(availability.windows_for(doctor.id, DayOfWeek::Tuesday).await.len(), 1);

    availability.delete_schedule(schedule.id).await.unwrap();
    assert!(availability.windows_for(doctor.id, DayOfWeek::Tuesday).await.is_empty());
    assert_matches!(
        availability.delete_schedule(schedule.id).await,
        Err(DoctorError::ScheduleNotFound)
    );
}

#[tokio::test]
async fn storage_rejects_duplicate_start_times_directly() {
    let (db, _, doctor) = doctor_with_db().await;

    let now = Utc::now();
    let schedule = shared_models::entities::DoctorSchedule {
        id: uuid::Uuid::new_v4(),
        doctor_id: doctor.id,
        day_of_week: DayOfWeek::Tuesday,
        start_time: time(9, 0),
        end_time: time(12, 0),
        max_patients_per_hour: 2,
        is_available: true,
        created_at: now,
        updated_at: now,
    };
    db.insert_schedule(schedule.clone()).await.unwrap();

    let duplicate = shared_models::entities::DoctorSchedule {
        id: uuid::Uuid::new_v4(),
        end_time: time(10, 0),
        ..schedule
    };
    assert_matches!(
        db.insert_schedule(duplicate).await,
        Err(shared_models::StoreError::UniqueViolation { .. })
    );
}

#[tokio::test]
async fn deleting_doctor_cascades_schedules() {
    let (db, availability, doctor) = doctor_with_db().await;

    let schedule = availability
        .create_schedule(doctor.id, window(time(9, 0), time(12, 0)))
        .await
        .unwrap();

    db.delete_doctor(doctor.id).await.unwrap();
    assert!(db.get_schedule(schedule.id).await.is_err());
}
