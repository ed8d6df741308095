use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use appointment_cell::{
    AppointmentError, AppointmentLifecycleService, AppointmentSearchQuery, BookAppointmentRequest,
    BookingService,
};
use doctor_cell::{AvailabilityService, CreateDoctorRequest, CreateScheduleRequest, DoctorService};
use patient_cell::{PatientRegistryService, RegisterPatientRequest};
use reference_cell::{CreateDepartmentRequest, DepartmentService};
use shared_config::AppConfig;
use shared_database::ClinicDatabase;
use shared_models::entities::{
    Appointment, AppointmentStatus, AppointmentType, DayOfWeek, Gender,
};

async fn booked_appointment() -> (BookingService, AppointmentLifecycleService, Appointment) {
    let db = ClinicDatabase::new();
    let departments = DepartmentService::new(db.clone());
    let doctors = DoctorService::new(db.clone());
    let patients = PatientRegistryService::new(db.clone());
    let availability = Arc::new(AvailabilityService::new(db.clone()));
    let booking = BookingService::new(db.clone(), availability.clone(), &AppConfig::default());
    let lifecycle = AppointmentLifecycleService::new(db.clone());

    let department = departments
        .create_department(CreateDepartmentRequest {
            name: "General Medicine".to_string(),
            head_name: None,
            location: None,
            phone: None,
            description: None,
        })
        .await
        .unwrap();
    let doctor = doctors
        .create_doctor(CreateDoctorRequest {
            first_name: "Ines".to_string(),
            last_name: "Moreau".to_string(),
            specialization: "General Medicine".to_string(),
            department_id: department.id,
            email: "i.moreau@clinic.example".to_string(),
            phone: None,
            license_number: "MD-77140".to_string(),
            consultation_fee: 90.0,
            years_experience: 5,
        })
        .await
        .unwrap();
    availability
        .create_schedule(
            doctor.id,
            CreateScheduleRequest {
                day_of_week: DayOfWeek::Monday,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                max_patients_per_hour: 4,
                is_available: Some(true),
            },
        )
        .await
        .unwrap();
    let patient = patients
        .register_patient(RegisterPatientRequest {
            first_name: "Ada".to_string(),
            last_name: "Okafor".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1992, 7, 2).unwrap(),
            gender: Gender::Female,
            phone: "+1-555-0142".to_string(),
            email: None,
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            blood_type: None,
            allergies: None,
            medical_history: None,
            insurance_provider: None,
            insurance_number: None,
        })
        .await
        .unwrap();

    let appointment = booking
        .request_booking(BookAppointmentRequest {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: next_monday(),
            start_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            duration_minutes: Some(30),
            appointment_type: AppointmentType::CheckUp,
            reason: None,
            fee_override: None,
        })
        .await
        .unwrap();

    (booking, lifecycle, appointment)
}

fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

#[tokio::test]
async fn walks_through_the_full_lifecycle() {
    let (_, lifecycle, appointment) = booked_appointment().await;

    let confirmed = lifecycle.confirm(appointment.id).await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let in_progress = lifecycle.check_in(appointment.id).await.unwrap();
    assert_eq!(in_progress.status, AppointmentStatus::InProgress);

    let completed = lifecycle.complete(appointment.id).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn rejects_completion_before_check_in() {
    let (_, lifecycle, appointment) = booked_appointment().await;

    let result = lifecycle.complete(appointment.id).await;
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Scheduled,
            to: AppointmentStatus::Completed,
        })
    );
}

#[tokio::test]
async fn terminal_states_accept_no_transition() {
    let (_, lifecycle, appointment) = booked_appointment().await;
    lifecycle.cancel(appointment.id).await.unwrap();

    assert_matches!(
        lifecycle.confirm(appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        lifecycle.cancel(appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn confirmed_appointment_can_no_show() {
    let (_, lifecycle, appointment) = booked_appointment().await;
    lifecycle.confirm(appointment.id).await.unwrap();

    let no_show = lifecycle.mark_no_show(appointment.id).await.unwrap();
    assert_eq!(no_show.status, AppointmentStatus::NoShow);
    assert!(no_show.status.is_terminal());
    assert!(!no_show.status.occupies_slot());
}

#[tokio::test]
async fn in_progress_cannot_be_cancelled() {
    let (_, lifecycle, appointment) = booked_appointment().await;
    lifecycle.confirm(appointment.id).await.unwrap();
    lifecycle.check_in(appointment.id).await.unwrap();

    assert_matches!(
        lifecycle.cancel(appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::InProgress,
            to: AppointmentStatus::Cancelled,
        })
    );
}

#[tokio::test]
async fn search_and_stats_reflect_outcomes() {
    let (booking, lifecycle, appointment) = booked_appointment().await;

    let second = booking
        .request_booking(BookAppointmentRequest {
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: next_monday(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            duration_minutes: Some(20),
            appointment_type: AppointmentType::FollowUp,
            reason: None,
            fee_override: None,
        })
        .await
        .unwrap();

    lifecycle.confirm(appointment.id).await.unwrap();
    lifecycle.check_in(appointment.id).await.unwrap();
    lifecycle.complete(appointment.id).await.unwrap();
    lifecycle.cancel(second.id).await.unwrap();

    let cancelled = booking
        .search_appointments(&AppointmentSearchQuery {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        })
        .await;
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, second.id);

    let stats = booking
        .appointment_stats(&AppointmentSearchQuery {
            doctor_id: Some(appointment.doctor_id),
            ..Default::default()
        })
        .await;
    assert_eq!(stats.total_appointments, 2);
    assert_eq!(stats.completed_appointments, 1);
    assert_eq!(stats.cancelled_appointments, 1);
    assert_eq!(stats.no_show_appointments, 0);
    assert_eq!(stats.average_completed_duration_minutes, 30);
}
