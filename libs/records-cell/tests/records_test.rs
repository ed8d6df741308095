use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use doctor_cell::{CreateDoctorRequest, DoctorService};
use patient_cell::{PatientRegistryService, RegisterPatientRequest};
use records_cell::{
    CreateMedicalRecordRequest, CreatePrescriptionRequest, MedicalRecordService,
    PrescriptionService, RecordsError,
};
use reference_cell::{
    CreateDepartmentRequest, CreateMedicationRequest, DepartmentService, MedicationService,
    ReferenceError,
};
use shared_database::ClinicDatabase;
use shared_models::entities::{
    Appointment, AppointmentStatus, AppointmentType, DosageForm, Gender, VitalSigns,
};

struct Fixture {
    db: ClinicDatabase,
    records: MedicalRecordService,
    prescriptions: PrescriptionService,
    medications: MedicationService,
    patient_id: Uuid,
    doctor_id: Uuid,
    medication_id: Uuid,
}

async fn fixture() -> Fixture {
    let db = ClinicDatabase::new();

    let department = DepartmentService::new(db.clone())
        .create_department(CreateDepartmentRequest {
            name: "Internal Medicine".to_string(),
            head_name: None,
            location: None,
            phone: None,
            description: None,
        })
        .await
        .unwrap();
    let doctor = DoctorService::new(db.clone())
        .create_doctor(CreateDoctorRequest {
            first_name: "Hana".to_string(),
            last_name: "Saito".to_string(),
            specialization: "Internal Medicine".to_string(),
            department_id: department.id,
            email: "h.saito@clinic.example".to_string(),
            phone: None,
            license_number: "MD-61420".to_string(),
            consultation_fee: 105.0,
            years_experience: 8,
        })
        .await
        .unwrap();
    let patient = PatientRegistryService::new(db.clone())
        .register_patient(RegisterPatientRequest {
            first_name: "Theo".to_string(),
            last_name: "Martens".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1979, 5, 30).unwrap(),
            gender: Gender::Male,
            phone: "+1-555-0188".to_string(),
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
    let medications = MedicationService::new(db.clone());
    let medication = medications
        .create_medication(CreateMedicationRequest {
            name: "Amoxicillin".to_string(),
            generic_name: None,
            manufacturer: None,
            dosage_form: DosageForm::Capsule,
            strength: "500mg".to_string(),
            unit_price: 0.8,
        })
        .await
        .unwrap();

    Fixture {
        records: MedicalRecordService::new(db.clone()),
        prescriptions: PrescriptionService::new(db.clone()),
        medications,
        db,
        patient_id: patient.id,
        doctor_id: doctor.id,
        medication_id: medication.id,
    }
}

fn record_request(fixture: &Fixture) -> CreateMedicalRecordRequest {
    CreateMedicalRecordRequest {
        patient_id: fixture.patient_id,
        doctor_id: fixture.doctor_id,
        appointment_id: None,
        diagnosis: "Acute sinusitis".to_string(),
        treatment_plan: Some("Antibiotics for 7 days".to_string()),
        vital_signs: None,
        symptoms: Some("Facial pain, congestion".to_string()),
        clinical_notes: None,
        follow_up: None,
    }
}

fn prescription_request(fixture: &Fixture) -> CreatePrescriptionRequest {
    CreatePrescriptionRequest {
        medication_id: fixture.medication_id,
        dosage: "500mg".to_string(),
        frequency: "three times daily".to_string(),
        duration_days: 7,
        quantity: 21,
        instructions: None,
        start_date: Utc::now().date_naive(),
        end_date: None,
    }
}

#[tokio::test]
async fn record_and_prescriptions_round_trip() {
    let fixture = fixture().await;

    let mut request = record_request(&fixture);
    request.vital_signs = Some(VitalSigns {
        temperature_celsius: Some(37.8),
        pulse_bpm: Some(82),
        ..Default::default()
    });
    let record = fixture.records.create_record(request).await.unwrap();
    assert_eq!(
        record.vital_signs.as_ref().and_then(|v| v.pulse_bpm),
        Some(82)
    );
    let prescription = fixture
        .prescriptions
        .add_prescription(record.id, prescription_request(&fixture))
        .await
        .unwrap();

    assert!(prescription.is_active);
    assert_eq!(
        fixture.prescriptions.prescriptions_for_record(record.id).await.len(),
        1
    );
    assert_eq!(fixture.records.records_for_patient(fixture.patient_id).await.len(), 1);
}

#[tokio::test]
async fn rejects_blank_diagnosis_and_bad_prescriptions() {
    let fixture = fixture().await;

    let mut blank = record_request(&fixture);
    blank.diagnosis = " ".to_string();
    assert_matches!(
        fixture.records.create_record(blank).await,
        Err(RecordsError::ValidationError(_))
    );

    let record = fixture.records.create_record(record_request(&fixture)).await.unwrap();

    let mut zero_days = prescription_request(&fixture);
    zero_days.duration_days = 0;
    assert_matches!(
        fixture.prescriptions.add_prescription(record.id, zero_days).await,
        Err(RecordsError::ValidationError(_))
    );

    let mut inverted_range = prescription_request(&fixture);
    inverted_range.end_date = Some(inverted_range.start_date - Duration::days(1));
    assert_matches!(
        fixture.prescriptions.add_prescription(record.id, inverted_range).await,
        Err(RecordsError::ValidationError(_))
    );

    let mut unknown_medication = prescription_request(&fixture);
    unknown_medication.medication_id = Uuid::new_v4();
    assert_matches!(
        fixture.prescriptions.add_prescription(record.id, unknown_medication).await,
        Err(RecordsError::MedicationNotFound)
    );
}

#[tokio::test]
async fn linked_appointment_must_match_the_encounter() {
    let fixture = fixture().await;
    let now = Utc::now();

    let appointment = fixture
        .db
        .insert_appointment(Appointment {
            id: Uuid::new_v4(),
            appointment_number: "APT-TEST0003".to_string(),
            patient_id: fixture.patient_id,
            doctor_id: fixture.doctor_id,
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 30,
            appointment_type: AppointmentType::Consultation,
            status: AppointmentStatus::Completed,
            reason: None,
            fee: 105.0,
            booked_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let mut linked = record_request(&fixture);
    linked.appointment_id = Some(appointment.id);
    let record = fixture.records.create_record(linked).await.unwrap();
    assert_eq!(record.appointment_id, Some(appointment.id));

    let other_patient = PatientRegistryService::new(fixture.db.clone())
        .register_patient(RegisterPatientRequest {
            first_name: "Iris".to_string(),
            last_name: "Vogel".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2001, 2, 12).unwrap(),
            gender: Gender::Female,
            phone: "+1-555-0111".to_string(),
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

    let mut mismatched = record_request(&fixture);
    mismatched.patient_id = other_patient.id;
    mismatched.appointment_id = Some(appointment.id);
    assert_matches!(
        fixture.records.create_record(mismatched).await,
        Err(RecordsError::AppointmentMismatch { .. })
    );
}

#[tokio::test]
async fn deleting_appointment_nulls_the_record_link() {
    let fixture = fixture().await;
    let now = Utc::now();

    let appointment = fixture
        .db
        .insert_appointment(Appointment {
            id: Uuid::new_v4(),
            appointment_number: "APT-TEST0004".to_string(),
            patient_id: fixture.patient_id,
            doctor_id: fixture.doctor_id,
            date: NaiveDate::from_ymd_opt(2030, 1, 14).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_minutes: 30,
            appointment_type: AppointmentType::FollowUp,
            status: AppointmentStatus::Completed,
            reason: None,
            fee: 105.0,
            booked_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let mut linked = record_request(&fixture);
    linked.appointment_id = Some(appointment.id);
    let record = fixture.records.create_record(linked).await.unwrap();

    fixture.db.delete_appointment(appointment.id).await.unwrap();

    let record = fixture.records.get_record(record.id).await.unwrap();
    assert_eq!(record.appointment_id, None);
}

#[tokio::test]
async fn deleting_record_cascades_prescriptions() {
    let fixture = fixture().await;

    let record = fixture.records.create_record(record_request(&fixture)).await.unwrap();
    let prescription = fixture
        .prescriptions
        .add_prescription(record.id, prescription_request(&fixture))
        .await
        .unwrap();

    fixture.records.delete_record(record.id).await.unwrap();

    assert_matches!(
        fixture.prescriptions.get_prescription(prescription.id).await,
        Err(RecordsError::PrescriptionNotFound)
    );
}

#[tokio::test]
async fn discontinuing_closes_the_prescription() {
    let fixture = fixture().await;

    let record = fixture.records.create_record(record_request(&fixture)).await.unwrap();
    let prescription = fixture
        .prescriptions
        .add_prescription(record.id, prescription_request(&fixture))
        .await
        .unwrap();

    let discontinued = fixture
        .prescriptions
        .discontinue_prescription(prescription.id)
        .await
        .unwrap();
    assert!(!discontinued.is_active);
    assert!(discontinued.end_date.is_some());

    fixture.prescriptions.delete_prescription(prescription.id).await.unwrap();
    assert_matches!(
        fixture.prescriptions.get_prescription(prescription.id).await,
        Err(RecordsError::PrescriptionNotFound)
    );
}

#[tokio::test]
async fn medication_delete_is_restricted_while_prescribed() {
    let fixture = fixture().await;

    let record = fixture.records.create_record(record_request(&fixture)).await.unwrap();
    fixture
        .prescriptions
        .add_prescription(record.id, prescription_request(&fixture))
        .await
        .unwrap();

    assert_matches!(
        fixture.medications.delete_medication(fixture.medication_id).await,
        Err(ReferenceError::InUse { dependents: 1 })
    );
}
