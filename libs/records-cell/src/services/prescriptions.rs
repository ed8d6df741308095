use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Prescription;

use crate::models::{CreatePrescriptionRequest, RecordsError};

pub struct PrescriptionService {
    db: ClinicDatabase,
}

impl PrescriptionService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    pub async fn add_prescription(
        &self,
        medical_record_id: Uuid,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, RecordsError> {
        if request.dosage.trim().is_empty() {
            return Err(RecordsError::ValidationError(
                "Dosage must not be empty".to_string(),
            ));
        }
        if request.frequency.trim().is_empty() {
            return Err(RecordsError::ValidationError(
                "Frequency must not be empty".to_string(),
            ));
        }
        if request.duration_days <= 0 {
            return Err(RecordsError::ValidationError(
                "Duration days must be positive".to_string(),
            ));
        }
        if request.quantity <= 0 {
            return Err(RecordsError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }
        if let Some(end_date) = request.end_date {
            if end_date < request.start_date {
                return Err(RecordsError::ValidationError(
                    "End date must not precede start date".to_string(),
                ));
            }
        }

        let prescription = Prescription {
            id: Uuid::new_v4(),
            medical_record_id,
            medication_id: request.medication_id,
            dosage: request.dosage,
            frequency: request.frequency,
            duration_days: request.duration_days,
            quantity: request.quantity,
            instructions: request.instructions,
            is_active: true,
            start_date: request.start_date,
            end_date: request.end_date,
            created_at: Utc::now(),
        };

        let prescription = self.db.insert_prescription(prescription).await?;
        info!(
            "Prescription {} added to record {}",
            prescription.id, medical_record_id
        );
        Ok(prescription)
    }

    pub async fn get_prescription(&self, id: Uuid) -> Result<Prescription, RecordsError> {
        Ok(self.db.get_prescription(id).await?)
    }

    pub async fn prescriptions_for_record(&self, medical_record_id: Uuid) -> Vec<Prescription> {
        self.db.prescriptions_for_record(medical_record_id).await
    }

    /// Marks the prescription inactive and closes its date range.
    pub async fn discontinue_prescription(&self, id: Uuid) -> Result<Prescription, RecordsError> {
        let mut prescription = self.db.get_prescription(id).await?;
        prescription.is_active = false;
        if prescription.end_date.is_none() {
            prescription.end_date = Some(Utc::now().date_naive());
        }
        let prescription = self.db.update_prescription(prescription).await?;
        info!("Prescription {} discontinued", id);
        Ok(prescription)
    }

    pub async fn delete_prescription(&self, id: Uuid) -> Result<(), RecordsError> {
        self.db.delete_prescription(id).await?;
        Ok(())
    }
}
