use serde::{Deserialize, Serialize};
use shared_models::entities::DosageForm;
use shared_models::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub head_name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub head_name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub generic_name: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: DosageForm,
    pub strength: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMedicationRequest {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<DosageForm>,
    pub strength: Option<String>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReferenceError {
    #[error("Reference record not found")]
    NotFound,

    #[error("Name {0} is already in use")]
    DuplicateName(String),

    #[error("Record is referenced by {dependents} dependent rows")]
    InUse { dependents: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<StoreError> for ReferenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ReferenceError::NotFound,
            StoreError::UniqueViolation { value, .. } => ReferenceError::DuplicateName(value),
            StoreError::ReferentialConflict { dependents, .. } => ReferenceError::InUse { dependents },
            StoreError::MissingReference { .. } => ReferenceError::NotFound,
        }
    }
}
