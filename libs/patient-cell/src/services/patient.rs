use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Patient;

use crate::models::{PatientError, RegisterPatientRequest, UpdatePatientRequest};

pub struct PatientRegistryService {
    db: ClinicDatabase,
    email_format: Regex,
}

impl PatientRegistryService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self {
            db,
            email_format: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
                .unwrap_or_else(|_| Regex::new("^$").unwrap()),
        }
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, PatientError> {
        self.validate_name(&request.first_name, &request.last_name)?;
        if request.date_of_birth >= Utc::now().date_naive() {
            return Err(PatientError::InvalidDateOfBirth);
        }
        if let Some(ref email) = request.email {
            if !self.email_format.is_match(email) {
                return Err(PatientError::InvalidEmail(email.clone()));
            }
        }
        if request.phone.trim().is_empty() {
            return Err(PatientError::ValidationError(
                "Phone number must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            patient_number: generate_patient_number(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            phone: request.phone,
            email: request.email,
            address: request.address,
            emergency_contact_name: request.emergency_contact_name,
            emergency_contact_phone: request.emergency_contact_phone,
            blood_type: request.blood_type,
            allergies: request.allergies,
            medical_history: request.medical_history,
            insurance_provider: request.insurance_provider,
            insurance_number: request.insurance_number,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let patient = self.db.insert_patient(patient).await?;
        info!("Patient {} registered as {}", patient.id, patient.patient_number);
        Ok(patient)
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, PatientError> {
        Ok(self.db.get_patient(id).await?)
    }

    pub async fn update_patient(
        &self,
        id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient {}", id);
        let mut patient = self.db.get_patient(id).await?;

        if let Some(first_name) = request.first_name {
            if first_name.trim().is_empty() {
                return Err(PatientError::ValidationError(
                    "First name must not be empty".to_string(),
                ));
            }
            patient.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            if last_name.trim().is_empty() {
                return Err(PatientError::ValidationError(
                    "Last name must not be empty".to_string(),
                ));
            }
            patient.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            if phone.trim().is_empty() {
                return Err(PatientError::ValidationError(
                    "Phone number must not be empty".to_string(),
                ));
            }
            patient.phone = phone;
        }
        if let Some(email) = request.email {
            if !self.email_format.is_match(&email) {
                return Err(PatientError::InvalidEmail(email));
            }
            patient.email = Some(email);
        }
        if let Some(address) = request.address {
            patient.address = Some(address);
        }
        if let Some(name) = request.emergency_contact_name {
            patient.emergency_contact_name = Some(name);
        }
        if let Some(phone) = request.emergency_contact_phone {
            patient.emergency_contact_phone = Some(phone);
        }
        if let Some(blood_type) = request.blood_type {
            patient.blood_type = Some(blood_type);
        }
        if let Some(allergies) = request.allergies {
            patient.allergies = Some(allergies);
        }
        if let Some(history) = request.medical_history {
            patient.medical_history = Some(history);
        }
        if let Some(provider) = request.insurance_provider {
            patient.insurance_provider = Some(provider);
        }
        if let Some(number) = request.insurance_number {
            patient.insurance_number = Some(number);
        }
        patient.updated_at = Utc::now();

        Ok(self.db.update_patient(patient).await?)
    }

    /// Soft deactivation: the registry keeps the row, the booking engine
    /// stops accepting the patient.
    pub async fn deactivate_patient(&self, id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.db.get_patient(id).await?;
        patient.is_active = false;
        patient.updated_at = Utc::now();
        let patient = self.db.update_patient(patient).await?;
        info!("Patient {} deactivated", id);
        Ok(patient)
    }

    pub async fn reactivate_patient(&self, id: Uuid) -> Result<Patient, PatientError> {
        let mut patient = self.db.get_patient(id).await?;
        patient.is_active = true;
        patient.updated_at = Utc::now();
        Ok(self.db.update_patient(patient).await?)
    }

    /// Hard delete, restricted while appointments or records reference the
    /// patient. Prefer `deactivate_patient`.
    pub async fn delete_patient(&self, id: Uuid) -> Result<(), PatientError> {
        self.db.delete_patient(id).await?;
        info!("Patient {} deleted", id);
        Ok(())
    }

    fn validate_name(&self, first_name: &str, last_name: &str) -> Result<(), PatientError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(PatientError::ValidationError(
                "Patient name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn generate_patient_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("PAT-{}", suffix)
}
