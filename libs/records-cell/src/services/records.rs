use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::MedicalRecord;

use crate::models::{CreateMedicalRecordRequest, RecordsError};

/// Clinical record store.
///
/// Records are append-mostly: there is no update operation, corrections are
/// appended as new records referencing the same encounter.
pub struct MedicalRecordService {
    db: ClinicDatabase,
}

impl MedicalRecordService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    pub async fn create_record(
        &self,
        request: CreateMedicalRecordRequest,
    ) -> Result<MedicalRecord, RecordsError> {
        if request.diagnosis.trim().is_empty() {
            return Err(RecordsError::ValidationError(
                "Diagnosis must not be empty".to_string(),
            ));
        }

        // A linked appointment must be the patient's own encounter with this
        // doctor.
        if let Some(appointment_id) = request.appointment_id {
            let appointment = self.db.get_appointment(appointment_id).await?;
            if appointment.patient_id != request.patient_id
                || appointment.doctor_id != request.doctor_id
            {
                return Err(RecordsError::AppointmentMismatch { appointment_id });
            }
        }

        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_id: request.appointment_id,
            diagnosis: request.diagnosis.trim().to_string(),
            treatment_plan: request.treatment_plan,
            vital_signs: request.vital_signs,
            symptoms: request.symptoms,
            clinical_notes: request.clinical_notes,
            follow_up: request.follow_up,
            created_at: Utc::now(),
        };

        let record = self.db.insert_medical_record(record).await?;
        info!(
            "Medical record {} created for patient {}",
            record.id, record.patient_id
        );
        Ok(record)
    }

    pub async fn get_record(&self, id: Uuid) -> Result<MedicalRecord, RecordsError> {
        Ok(self.db.get_medical_record(id).await?)
    }

    /// Patient history, newest first.
    pub async fn records_for_patient(&self, patient_id: Uuid) -> Vec<MedicalRecord> {
        let records = self.db.records_for_patient(patient_id).await;
        debug!("Patient {} has {} records", patient_id, records.len());
        records
    }

    /// Deleting a record takes its prescriptions with it.
    pub async fn delete_record(&self, id: Uuid) -> Result<(), RecordsError> {
        self.db.delete_medical_record(id).await?;
        info!("Medical record {} deleted", id);
        Ok(())
    }
}
