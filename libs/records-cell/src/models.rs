use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::entities::VitalSigns;
use shared_models::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub diagnosis: String,
    pub treatment_plan: Option<String>,
    pub vital_signs: Option<VitalSigns>,
    pub symptoms: Option<String>,
    pub clinical_notes: Option<String>,
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub medication_id: Uuid,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i32,
    pub quantity: i32,
    pub instructions: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordsError {
    #[error("Medical record not found")]
    RecordNotFound,

    #[error("Prescription not found")]
    PrescriptionNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Medication not found")]
    MedicationNotFound,

    #[error("Appointment {appointment_id} belongs to a different patient or doctor")]
    AppointmentMismatch { appointment_id: Uuid },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for RecordsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "medical_record", .. } => RecordsError::RecordNotFound,
            StoreError::NotFound { entity: "prescription", .. } => RecordsError::PrescriptionNotFound,
            StoreError::NotFound { entity: "patient", .. } => RecordsError::PatientNotFound,
            StoreError::NotFound { entity: "doctor", .. } => RecordsError::DoctorNotFound,
            StoreError::NotFound { entity: "appointment", .. } => RecordsError::AppointmentNotFound,
            StoreError::NotFound { entity: "medication", .. } => RecordsError::MedicationNotFound,
            StoreError::MissingReference { field: "patient_id", .. } => RecordsError::PatientNotFound,
            StoreError::MissingReference { field: "doctor_id", .. } => RecordsError::DoctorNotFound,
            StoreError::MissingReference { field: "appointment_id", .. } => {
                RecordsError::AppointmentNotFound
            }
            StoreError::MissingReference { field: "medication_id", .. } => {
                RecordsError::MedicationNotFound
            }
            StoreError::MissingReference { field: "medical_record_id", .. } => {
                RecordsError::RecordNotFound
            }
            other => RecordsError::DatabaseError(other.to_string()),
        }
    }
}
