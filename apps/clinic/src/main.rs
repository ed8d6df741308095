use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::{
    AppointmentLifecycleService, AppointmentSearchQuery, BookAppointmentRequest, BookingService,
};
use doctor_cell::{AvailabilityService, CreateDoctorRequest, CreateScheduleRequest, DoctorService};
use patient_cell::{PatientRegistryService, RegisterPatientRequest};
use records_cell::{
    CreateMedicalRecordRequest, CreatePrescriptionRequest, MedicalRecordService, PrescriptionService,
};
use reference_cell::{
    CreateDepartmentRequest, CreateMedicationRequest, DepartmentService, MedicationService,
};
use shared_config::AppConfig;
use shared_database::ClinicDatabase;
use shared_models::entities::{AppointmentType, DayOfWeek, DosageForm, Gender};

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking walkthrough");

    let config = AppConfig::from_env();
    let db = ClinicDatabase::new();

    let departments = DepartmentService::new(db.clone());
    let medications = MedicationService::new(db.clone());
    let patients = PatientRegistryService::new(db.clone());
    let doctors = DoctorService::new(db.clone());
    let availability = Arc::new(AvailabilityService::new(db.clone()));
    let booking = BookingService::new(db.clone(), availability.clone(), &config);
    let lifecycle = AppointmentLifecycleService::new(db.clone());
    let records = MedicalRecordService::new(db.clone());
    let prescriptions = PrescriptionService::new(db.clone());

    // Reference data
    let cardiology = departments
        .create_department(CreateDepartmentRequest {
            name: "Cardiology".to_string(),
            head_name: Some("Dr. Elena Vasquez".to_string()),
            location: Some("Building A, Floor 2".to_string()),
            phone: Some("+1-555-0100".to_string()),
            description: Some("Cardiovascular care".to_string()),
        })
        .await?;

    let atenolol = medications
        .create_medication(CreateMedicationRequest {
            name: "Atenolol".to_string(),
            generic_name: Some("atenolol".to_string()),
            manufacturer: Some("Generic Pharma".to_string()),
            dosage_form: DosageForm::Tablet,
            strength: "50mg".to_string(),
            unit_price: 0.35,
        })
        .await?;

    // Parties
    let doctor = doctors
        .create_doctor(CreateDoctorRequest {
            first_name: "Elena".to_string(),
            last_name: "Vasquez".to_string(),
            specialization: "Cardiology".to_string(),
            department_id: cardiology.id,
            email: "e.vasquez@clinic.example".to_string(),
            phone: Some("+1-555-0101".to_string()),
            license_number: "MD-48213".to_string(),
            consultation_fee: 150.0,
            years_experience: 12,
        })
        .await?;

    let patient = patients
        .register_patient(RegisterPatientRequest {
            first_name: "Marcus".to_string(),
            last_name: "Reed".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14)
                .unwrap_or_else(|| Utc::now().date_naive() - Duration::days(365 * 40)),
            gender: Gender::Male,
            phone: "+1-555-0199".to_string(),
            email: Some("marcus.reed@example.com".to_string()),
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            blood_type: None,
            allergies: Some("penicillin".to_string()),
            medical_history: None,
            insurance_provider: None,
            insurance_number: None,
        })
        .await?;

    // Recurring availability: Mondays 09:00-17:00, three patients per hour
    let monday_start = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
    let monday_end = NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default();
    availability
        .create_schedule(
            doctor.id,
            CreateScheduleRequest {
                day_of_week: DayOfWeek::Monday,
                start_time: monday_start,
                end_time: monday_end,
                max_patients_per_hour: 3,
                is_available: Some(true),
            },
        )
        .await?;

    // Book the next Monday, then walk the appointment through its lifecycle
    let date = next_monday();
    let appointment = booking
        .request_booking(BookAppointmentRequest {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            duration_minutes: Some(30),
            appointment_type: AppointmentType::Consultation,
            reason: Some("Chest pain on exertion".to_string()),
            fee_override: None,
        })
        .await?;
    info!(
        "Booked {} for {} with Dr. {} on {} at {} (fee {})",
        appointment.appointment_number,
        patient.full_name(),
        doctor.full_name(),
        appointment.date,
        appointment.start_time,
        appointment.fee
    );

    lifecycle.confirm(appointment.id).await?;
    lifecycle.check_in(appointment.id).await?;
    lifecycle.complete(appointment.id).await?;

    // Document the encounter
    let record = records
        .create_record(CreateMedicalRecordRequest {
            patient_id: patient.id,
            doctor_id: doctor.id,
            appointment_id: Some(appointment.id),
            diagnosis: "Stable angina".to_string(),
            treatment_plan: Some("Beta blocker, follow-up in 4 weeks".to_string()),
            vital_signs: None,
            symptoms: Some("Chest pain on exertion".to_string()),
            clinical_notes: None,
            follow_up: Some("4 weeks".to_string()),
        })
        .await?;

    prescriptions
        .add_prescription(
            record.id,
            CreatePrescriptionRequest {
                medication_id: atenolol.id,
                dosage: "50mg".to_string(),
                frequency: "once daily".to_string(),
                duration_days: 28,
                quantity: 28,
                instructions: Some("Take in the morning".to_string()),
                start_date: date,
                end_date: None,
            },
        )
        .await?;

    // A second booking in the freed slot after a cancellation
    let second = booking
        .request_booking(BookAppointmentRequest {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            duration_minutes: Some(30),
            appointment_type: AppointmentType::FollowUp,
            reason: None,
            fee_override: None,
        })
        .await?;
    lifecycle.cancel(second.id).await?;
    let rebooked = booking
        .request_booking(BookAppointmentRequest {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            duration_minutes: Some(30),
            appointment_type: AppointmentType::FollowUp,
            reason: None,
            fee_override: None,
        })
        .await?;
    info!(
        "Rebooked cancelled slot as {} at {}",
        rebooked.appointment_number, rebooked.start_time
    );

    let stats = booking
        .appointment_stats(&AppointmentSearchQuery {
            doctor_id: Some(doctor.id),
            ..Default::default()
        })
        .await;
    info!(
        "Doctor {} stats: {} total, {} completed, {} cancelled",
        doctor.doctor_number,
        stats.total_appointments,
        stats.completed_appointments,
        stats.cancelled_appointments
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != chrono::Weekday::Mon {
        date += Duration::days(1);
    }
    date
}
