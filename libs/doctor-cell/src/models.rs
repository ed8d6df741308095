use serde::{Deserialize, Serialize};
use chrono::NaiveTime;
use uuid::Uuid;

use shared_models::entities::DayOfWeek;
use shared_models::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub department_id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub consultation_fee: f64,
    pub years_experience: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub department_id: Option<Uuid>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub consultation_fee: Option<f64>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_patients_per_hour: i32,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_patients_per_hour: Option<i32>,
    pub is_available: Option<bool>,
}

/// One recurring weekly window a doctor accepts appointments in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_per_hour: i32,
    pub is_available: bool,
}

impl AvailabilityWindow {
    /// True iff [start, start + duration) fits entirely inside this window.
    pub fn contains_interval(&self, start: NaiveTime, duration_minutes: i32) -> bool {
        let (end, wrapped) =
            start.overflowing_add_signed(chrono::Duration::minutes(duration_minutes as i64));
        // intervals wrapping past midnight never fit a same-day window
        if wrapped != 0 {
            return false;
        }
        start >= self.start_time && end <= self.end_time
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Schedule not found")]
    ScheduleNotFound,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("{field} {value} is already in use")]
    Duplicate { field: String, value: String },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Schedule window must end after it starts")]
    InvalidTimeRange,

    #[error("Schedule window overlaps an existing window on {day} ({start}-{end})")]
    ScheduleOverlap {
        day: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Doctor has {dependents} dependent rows and cannot be deleted")]
    ReferentialConflict { dependents: usize },
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "doctor_schedule", .. } => DoctorError::ScheduleNotFound,
            StoreError::NotFound { .. } => DoctorError::NotFound,
            StoreError::MissingReference { field: "department_id", .. } => {
                DoctorError::DepartmentNotFound
            }
            StoreError::MissingReference { .. } => DoctorError::NotFound,
            StoreError::UniqueViolation { field, value, .. } => DoctorError::Duplicate {
                field: field.to_string(),
                value,
            },
            StoreError::ReferentialConflict { dependents, .. } => {
                DoctorError::ReferentialConflict { dependents }
            }
        }
    }
}
