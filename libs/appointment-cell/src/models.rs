use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_models::entities::{AppointmentStatus, AppointmentType};
use shared_models::StoreError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Falls back to the configured default duration when absent.
    pub duration_minutes: Option<i32>,
    pub appointment_type: AppointmentType,
    pub reason: Option<String>,
    /// Overrides the doctor's current consultation fee when set.
    pub fee_override: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

// ==============================================================================
// STATISTICS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total_appointments: i32,
    pub completed_appointments: i32,
    pub cancelled_appointments: i32,
    pub no_show_appointments: i32,
    pub average_completed_duration_minutes: i32,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Booking rejections are expected outcomes of normal use and carry the
/// conflicting row where one exists.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient is not active")]
    PatientInactive,

    #[error("Doctor is not active")]
    DoctorInactive,

    #[error("No available window covers {date} {start_time}")]
    OutsideAvailability { date: NaiveDate, start_time: NaiveTime },

    #[error("Hourly capacity reached: {booked} of {max_per_hour} slots taken")]
    CapacityExceeded { max_per_hour: i32, booked: i32 },

    #[error("Requested slot overlaps appointment {conflicting_appointment}")]
    SlotConflict { conflicting_appointment: Uuid },

    #[error("Patient already has overlapping appointment {conflicting_appointment}")]
    PatientDoubleBooked { conflicting_appointment: Uuid },

    #[error("Another booking for this doctor is in flight, retry the request")]
    ConcurrentModification,

    #[error("Status transition {from} -> {to} is not allowed")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "doctor", .. } => AppointmentError::DoctorNotFound,
            StoreError::NotFound { entity: "patient", .. } => AppointmentError::PatientNotFound,
            StoreError::NotFound { .. } => AppointmentError::NotFound,
            StoreError::MissingReference { field: "doctor_id", .. } => {
                AppointmentError::DoctorNotFound
            }
            StoreError::MissingReference { field: "patient_id", .. } => {
                AppointmentError::PatientNotFound
            }
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}
