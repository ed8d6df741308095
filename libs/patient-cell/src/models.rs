use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use shared_models::entities::{BloodType, Gender};
use shared_models::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient number {0} already exists")]
    PatientNumberExists(String),

    #[error("Date of birth must be in the past")]
    InvalidDateOfBirth,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Patient has {dependents} dependent rows and cannot be deleted")]
    ReferentialConflict { dependents: usize },
}

impl From<StoreError> for PatientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } | StoreError::MissingReference { .. } => PatientError::NotFound,
            StoreError::UniqueViolation { value, .. } => PatientError::PatientNumberExists(value),
            StoreError::ReferentialConflict { dependents, .. } => {
                PatientError::ReferentialConflict { dependents }
            }
        }
    }
}
