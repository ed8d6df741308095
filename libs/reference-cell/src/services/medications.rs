use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Medication;

use crate::models::{CreateMedicationRequest, ReferenceError, UpdateMedicationRequest};

pub struct MedicationService {
    db: ClinicDatabase,
}

impl MedicationService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    pub async fn create_medication(
        &self,
        request: CreateMedicationRequest,
    ) -> Result<Medication, ReferenceError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ReferenceError::ValidationError(
                "Medication name must not be empty".to_string(),
            ));
        }
        if request.unit_price < 0.0 {
            return Err(ReferenceError::ValidationError(
                "Unit price must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let medication = Medication {
            id: Uuid::new_v4(),
            name,
            generic_name: request.generic_name,
            manufacturer: request.manufacturer,
            dosage_form: request.dosage_form,
            strength: request.strength,
            unit_price: request.unit_price,
            created_at: now,
            updated_at: now,
        };

        let medication = self.db.insert_medication(medication).await?;
        info!("Medication {} created: {}", medication.id, medication.name);
        Ok(medication)
    }

    pub async fn get_medication(&self, id: Uuid) -> Result<Medication, ReferenceError> {
        Ok(self.db.get_medication(id).await?)
    }

    pub async fn list_medications(&self) -> Vec<Medication> {
        self.db.list_medications().await
    }

    pub async fn update_medication(
        &self,
        id: Uuid,
        request: UpdateMedicationRequest,
    ) -> Result<Medication, ReferenceError> {
        debug!("Updating medication {}", id);
        let mut medication = self.db.get_medication(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ReferenceError::ValidationError(
                    "Medication name must not be empty".to_string(),
                ));
            }
            medication.name = name;
        }
        if let Some(generic_name) = request.generic_name {
            medication.generic_name = Some(generic_name);
        }
        if let Some(manufacturer) = request.manufacturer {
            medication.manufacturer = Some(manufacturer);
        }
        if let Some(dosage_form) = request.dosage_form {
            medication.dosage_form = dosage_form;
        }
        if let Some(strength) = request.strength {
            medication.strength = strength;
        }
        if let Some(unit_price) = request.unit_price {
            if unit_price < 0.0 {
                return Err(ReferenceError::ValidationError(
                    "Unit price must not be negative".to_string(),
                ));
            }
            medication.unit_price = unit_price;
        }
        medication.updated_at = Utc::now();

        Ok(self.db.update_medication(medication).await?)
    }

    /// Restricted while prescriptions reference the medication.
    pub async fn delete_medication(&self, id: Uuid) -> Result<(), ReferenceError> {
        self.db.delete_medication(id).await?;
        info!("Medication {} deleted", id);
        Ok(())
    }
}
