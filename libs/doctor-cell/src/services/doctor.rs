use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Doctor;

use crate::models::{CreateDoctorRequest, DoctorError, UpdateDoctorRequest};

pub struct DoctorService {
    db: ClinicDatabase,
    email_format: Regex,
}

impl DoctorService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self {
            db,
            email_format: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
                .unwrap_or_else(|_| Regex::new("^$").unwrap()),
        }
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "Doctor name must not be empty".to_string(),
            ));
        }
        if !self.email_format.is_match(&request.email) {
            return Err(DoctorError::InvalidEmail(request.email));
        }
        if request.license_number.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "License number must not be empty".to_string(),
            ));
        }
        if request.consultation_fee <= 0.0 {
            return Err(DoctorError::ValidationError(
                "Consultation fee must be positive".to_string(),
            ));
        }
        if request.years_experience < 0 {
            return Err(DoctorError::ValidationError(
                "Experience years must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            doctor_number: generate_doctor_number(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            specialization: request.specialization,
            department_id: request.department_id,
            email: request.email,
            phone: request.phone,
            license_number: request.license_number,
            consultation_fee: request.consultation_fee,
            years_experience: request.years_experience,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let doctor = self.db.insert_doctor(doctor).await?;
        info!("Doctor {} created as {}", doctor.id, doctor.doctor_number);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, DoctorError> {
        Ok(self.db.get_doctor(id).await?)
    }

    pub async fn update_doctor(
        &self,
        id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor {}", id);
        let mut doctor = self.db.get_doctor(id).await?;

        if let Some(first_name) = request.first_name {
            if first_name.trim().is_empty() {
                return Err(DoctorError::ValidationError(
                    "First name must not be empty".to_string(),
                ));
            }
            doctor.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            if last_name.trim().is_empty() {
                return Err(DoctorError::ValidationError(
                    "Last name must not be empty".to_string(),
                ));
            }
            doctor.last_name = last_name.trim().to_string();
        }
        if let Some(specialization) = request.specialization {
            doctor.specialization = specialization;
        }
        if let Some(department_id) = request.department_id {
            doctor.department_id = department_id;
        }
        if let Some(email) = request.email {
            if !self.email_format.is_match(&email) {
                return Err(DoctorError::InvalidEmail(email));
            }
            doctor.email = email;
        }
        if let Some(phone) = request.phone {
            doctor.phone = Some(phone);
        }
        if let Some(fee) = request.consultation_fee {
            if fee <= 0.0 {
                return Err(DoctorError::ValidationError(
                    "Consultation fee must be positive".to_string(),
                ));
            }
            doctor.consultation_fee = fee;
        }
        if let Some(years) = request.years_experience {
            if years < 0 {
                return Err(DoctorError::ValidationError(
                    "Experience years must not be negative".to_string(),
                ));
            }
            doctor.years_experience = years;
        }
        doctor.updated_at = Utc::now();

        Ok(self.db.update_doctor(doctor).await?)
    }

    /// Soft deactivation: keeps the row, the booking engine stops accepting
    /// the doctor.
    pub async fn deactivate_doctor(&self, id: Uuid) -> Result<Doctor, DoctorError> {
        let mut doctor = self.db.get_doctor(id).await?;
        doctor.is_active = false;
        doctor.updated_at = Utc::now();
        let doctor = self.db.update_doctor(doctor).await?;
        info!("Doctor {} deactivated", id);
        Ok(doctor)
    }

    pub async fn reactivate_doctor(&self, id: Uuid) -> Result<Doctor, DoctorError> {
        let mut doctor = self.db.get_doctor(id).await?;
        doctor.is_active = true;
        doctor.updated_at = Utc::now();
        Ok(self.db.update_doctor(doctor).await?)
    }

    /// Hard delete: restricted while appointments or records reference the
    /// doctor; the doctor's schedule rows cascade.
    pub async fn delete_doctor(&self, id: Uuid) -> Result<(), DoctorError> {
        self.db.delete_doctor(id).await?;
        info!("Doctor {} deleted", id);
        Ok(())
    }
}

fn generate_doctor_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("DOC-{}", suffix)
}
