use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::entities::{
    Appointment, DayOfWeek, Department, Doctor, DoctorSchedule, MedicalRecord, Medication,
    Patient, Prescription,
};
use shared_models::StoreError;

#[derive(Default)]
struct Tables {
    departments: HashMap<Uuid, Department>,
    medications: HashMap<Uuid, Medication>,
    patients: HashMap<Uuid, Patient>,
    doctors: HashMap<Uuid, Doctor>,
    schedules: HashMap<Uuid, DoctorSchedule>,
    appointments: HashMap<Uuid, Appointment>,
    medical_records: HashMap<Uuid, MedicalRecord>,
    prescriptions: HashMap<Uuid, Prescription>,
}

/// Transactional in-memory persistence layer for the clinic data model.
///
/// Enforces the unique constraints and referential actions (restrict,
/// cascade, set-null) of the schema; each method holds the table lock for
/// the whole check-then-write sequence, so single calls are atomic.
#[derive(Clone, Default)]
pub struct ClinicDatabase {
    inner: Arc<RwLock<Tables>>,
}

impl ClinicDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // DEPARTMENTS
    // ==========================================================================

    pub async fn insert_department(&self, department: Department) -> Result<Department, StoreError> {
        let mut tables = self.inner.write().await;
        if let Some(existing) = tables
            .departments
            .values()
            .find(|d| d.name.eq_ignore_ascii_case(&department.name))
        {
            return Err(StoreError::UniqueViolation {
                entity: "department",
                field: "name",
                value: existing.name.clone(),
            });
        }
        debug!("Inserting department {}", department.id);
        tables.departments.insert(department.id, department.clone());
        Ok(department)
    }

    pub async fn get_department(&self, id: Uuid) -> Result<Department, StoreError> {
        let tables = self.inner.read().await;
        tables
            .departments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "department", id })
    }

    pub async fn list_departments(&self) -> Vec<Department> {
        let tables = self.inner.read().await;
        let mut departments: Vec<_> = tables.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        departments
    }

    pub async fn update_department(&self, department: Department) -> Result<Department, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.departments.contains_key(&department.id) {
            return Err(StoreError::NotFound { entity: "department", id: department.id });
        }
        if let Some(existing) = tables
            .departments
            .values()
            .find(|d| d.id != department.id && d.name.eq_ignore_ascii_case(&department.name))
        {
            return Err(StoreError::UniqueViolation {
                entity: "department",
                field: "name",
                value: existing.name.clone(),
            });
        }
        tables.departments.insert(department.id, department.clone());
        Ok(department)
    }

    pub async fn delete_department(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.departments.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "department", id });
        }
        let dependents = tables.doctors.values().filter(|d| d.department_id == id).count();
        if dependents > 0 {
            return Err(StoreError::ReferentialConflict { entity: "department", id, dependents });
        }
        tables.departments.remove(&id);
        Ok(())
    }

    // ==========================================================================
    // MEDICATIONS
    // ==========================================================================

    pub async fn insert_medication(&self, medication: Medication) -> Result<Medication, StoreError> {
        let mut tables = self.inner.write().await;
        if let Some(existing) = tables
            .medications
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(&medication.name))
        {
            return Err(StoreError::UniqueViolation {
                entity: "medication",
                field: "name",
                value: existing.name.clone(),
            });
        }
        tables.medications.insert(medication.id, medication.clone());
        Ok(medication)
    }

    pub async fn get_medication(&self, id: Uuid) -> Result<Medication, StoreError> {
        let tables = self.inner.read().await;
        tables
            .medications
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "medication", id })
    }

    pub async fn list_medications(&self) -> Vec<Medication> {
        let tables = self.inner.read().await;
        let mut medications: Vec<_> = tables.medications.values().cloned().collect();
        medications.sort_by(|a, b| a.name.cmp(&b.name));
        medications
    }

    pub async fn update_medication(&self, medication: Medication) -> Result<Medication, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.medications.contains_key(&medication.id) {
            return Err(StoreError::NotFound { entity: "medication", id: medication.id });
        }
        if let Some(existing) = tables
            .medications
            .values()
            .find(|m| m.id != medication.id && m.name.eq_ignore_ascii_case(&medication.name))
        {
            return Err(StoreError::UniqueViolation {
                entity: "medication",
                field: "name",
                value: existing.name.clone(),
            });
        }
        tables.medications.insert(medication.id, medication.clone());
        Ok(medication)
    }

    pub async fn delete_medication(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.medications.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "medication", id });
        }
        let dependents = tables
            .prescriptions
            .values()
            .filter(|p| p.medication_id == id)
            .count();
        if dependents > 0 {
            return Err(StoreError::ReferentialConflict { entity: "medication", id, dependents });
        }
        tables.medications.remove(&id);
        Ok(())
    }

    // ==========================================================================
    // PATIENTS
    // ==========================================================================

    pub async fn insert_patient(&self, patient: Patient) -> Result<Patient, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .patients
            .values()
            .any(|p| p.patient_number == patient.patient_number)
        {
            return Err(StoreError::UniqueViolation {
                entity: "patient",
                field: "patient_number",
                value: patient.patient_number.clone(),
            });
        }
        debug!("Inserting patient {}", patient.patient_number);
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, StoreError> {
        let tables = self.inner.read().await;
        tables
            .patients
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "patient", id })
    }

    pub async fn update_patient(&self, patient: Patient) -> Result<Patient, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.patients.contains_key(&patient.id) {
            return Err(StoreError::NotFound { entity: "patient", id: patient.id });
        }
        if tables
            .patients
            .values()
            .any(|p| p.id != patient.id && p.patient_number == patient.patient_number)
        {
            return Err(StoreError::UniqueViolation {
                entity: "patient",
                field: "patient_number",
                value: patient.patient_number.clone(),
            });
        }
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub async fn delete_patient(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.patients.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "patient", id });
        }
        let dependents = tables.appointments.values().filter(|a| a.patient_id == id).count()
            + tables.medical_records.values().filter(|r| r.patient_id == id).count();
        if dependents > 0 {
            return Err(StoreError::ReferentialConflict { entity: "patient", id, dependents });
        }
        tables.patients.remove(&id);
        Ok(())
    }

    // ==========================================================================
    // DOCTORS
    // ==========================================================================

    pub async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.departments.contains_key(&doctor.department_id) {
            return Err(StoreError::MissingReference {
                entity: "doctor",
                field: "department_id",
                id: doctor.department_id,
            });
        }
        Self::check_doctor_uniqueness(&tables, &doctor, None)?;
        debug!("Inserting doctor {}", doctor.doctor_number);
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, StoreError> {
        let tables = self.inner.read().await;
        tables
            .doctors
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "doctor", id })
    }

    pub async fn update_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.doctors.contains_key(&doctor.id) {
            return Err(StoreError::NotFound { entity: "doctor", id: doctor.id });
        }
        if !tables.departments.contains_key(&doctor.department_id) {
            return Err(StoreError::MissingReference {
                entity: "doctor",
                field: "department_id",
                id: doctor.department_id,
            });
        }
        Self::check_doctor_uniqueness(&tables, &doctor, Some(doctor.id))?;
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    /// Restricts on appointments and medical records; cascades to the
    /// doctor's schedule rows.
    pub async fn delete_doctor(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.doctors.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "doctor", id });
        }
        let dependents = tables.appointments.values().filter(|a| a.doctor_id == id).count()
            + tables.medical_records.values().filter(|r| r.doctor_id == id).count();
        if dependents > 0 {
            return Err(StoreError::ReferentialConflict { entity: "doctor", id, dependents });
        }
        tables.schedules.retain(|_, s| s.doctor_id != id);
        tables.doctors.remove(&id);
        Ok(())
    }

    fn check_doctor_uniqueness(
        tables: &Tables,
        doctor: &Doctor,
        exclude: Option<Uuid>,
    ) -> Result<(), StoreError> {
        for other in tables.doctors.values() {
            if Some(other.id) == exclude {
                continue;
            }
            if other.doctor_number == doctor.doctor_number {
                return Err(StoreError::UniqueViolation {
                    entity: "doctor",
                    field: "doctor_number",
                    value: doctor.doctor_number.clone(),
                });
            }
            if other.email.eq_ignore_ascii_case(&doctor.email) {
                return Err(StoreError::UniqueViolation {
                    entity: "doctor",
                    field: "email",
                    value: doctor.email.clone(),
                });
            }
            if other.license_number == doctor.license_number {
                return Err(StoreError::UniqueViolation {
                    entity: "doctor",
                    field: "license_number",
                    value: doctor.license_number.clone(),
                });
            }
        }
        Ok(())
    }

    // ==========================================================================
    // DOCTOR SCHEDULES
    // ==========================================================================

    pub async fn insert_schedule(&self, schedule: DoctorSchedule) -> Result<DoctorSchedule, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.doctors.contains_key(&schedule.doctor_id) {
            return Err(StoreError::MissingReference {
                entity: "doctor_schedule",
                field: "doctor_id",
                id: schedule.doctor_id,
            });
        }
        if tables.schedules.values().any(|s| {
            s.doctor_id == schedule.doctor_id
                && s.day_of_week == schedule.day_of_week
                && s.start_time == schedule.start_time
        }) {
            return Err(StoreError::UniqueViolation {
                entity: "doctor_schedule",
                field: "doctor_id, day_of_week, start_time",
                value: format!("{} {}", schedule.day_of_week, schedule.start_time),
            });
        }
        tables.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    pub async fn get_schedule(&self, id: Uuid) -> Result<DoctorSchedule, StoreError> {
        let tables = self.inner.read().await;
        tables
            .schedules
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "doctor_schedule", id })
    }

    pub async fn update_schedule(&self, schedule: DoctorSchedule) -> Result<DoctorSchedule, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.schedules.contains_key(&schedule.id) {
            return Err(StoreError::NotFound { entity: "doctor_schedule", id: schedule.id });
        }
        if tables.schedules.values().any(|s| {
            s.id != schedule.id
                && s.doctor_id == schedule.doctor_id
                && s.day_of_week == schedule.day_of_week
                && s.start_time == schedule.start_time
        }) {
            return Err(StoreError::UniqueViolation {
                entity: "doctor_schedule",
                field: "doctor_id, day_of_week, start_time",
                value: format!("{} {}", schedule.day_of_week, schedule.start_time),
            });
        }
        tables.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    pub async fn delete_schedule(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if tables.schedules.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "doctor_schedule", id });
        }
        Ok(())
    }

    pub async fn schedules_for_doctor(&self, doctor_id: Uuid) -> Vec<DoctorSchedule> {
        let tables = self.inner.read().await;
        let mut schedules: Vec<_> = tables
            .schedules
            .values()
            .filter(|s| s.doctor_id == doctor_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| (s.day_of_week as u8, s.start_time));
        schedules
    }

    pub async fn schedules_for_doctor_day(
        &self,
        doctor_id: Uuid,
        day: DayOfWeek,
    ) -> Vec<DoctorSchedule> {
        let tables = self.inner.read().await;
        let mut schedules: Vec<_> = tables
            .schedules
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.day_of_week == day)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.start_time);
        schedules
    }

    // ==========================================================================
    // APPOINTMENTS
    // ==========================================================================

    pub async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.patients.contains_key(&appointment.patient_id) {
            return Err(StoreError::MissingReference {
                entity: "appointment",
                field: "patient_id",
                id: appointment.patient_id,
            });
        }
        if !tables.doctors.contains_key(&appointment.doctor_id) {
            return Err(StoreError::MissingReference {
                entity: "appointment",
                field: "doctor_id",
                id: appointment.doctor_id,
            });
        }
        if tables
            .appointments
            .values()
            .any(|a| a.appointment_number == appointment.appointment_number)
        {
            return Err(StoreError::UniqueViolation {
                entity: "appointment",
                field: "appointment_number",
                value: appointment.appointment_number.clone(),
            });
        }
        debug!("Inserting appointment {}", appointment.appointment_number);
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let tables = self.inner.read().await;
        tables
            .appointments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "appointment", id })
    }

    pub async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.appointments.contains_key(&appointment.id) {
            return Err(StoreError::NotFound { entity: "appointment", id: appointment.id });
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    pub async fn list_appointments(&self) -> Vec<Appointment> {
        let tables = self.inner.read().await;
        let mut appointments: Vec<_> = tables.appointments.values().cloned().collect();
        appointments.sort_by_key(|a| (a.date, a.start_time));
        appointments
    }

    pub async fn appointments_for_doctor_on(&self, doctor_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        let tables = self.inner.read().await;
        let mut appointments: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.date == date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        appointments
    }

    pub async fn appointments_for_patient_on(&self, patient_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        let tables = self.inner.read().await;
        let mut appointments: Vec<_> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id && a.date == date)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        appointments
    }

    /// Nulls the appointment reference on any medical record pointing at it.
    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.appointments.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "appointment", id });
        }
        for record in tables.medical_records.values_mut() {
            if record.appointment_id == Some(id) {
                record.appointment_id = None;
            }
        }
        tables.appointments.remove(&id);
        Ok(())
    }

    // ==========================================================================
    // MEDICAL RECORDS
    // ==========================================================================

    pub async fn insert_medical_record(&self, record: MedicalRecord) -> Result<MedicalRecord, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.patients.contains_key(&record.patient_id) {
            return Err(StoreError::MissingReference {
                entity: "medical_record",
                field: "patient_id",
                id: record.patient_id,
            });
        }
        if !tables.doctors.contains_key(&record.doctor_id) {
            return Err(StoreError::MissingReference {
                entity: "medical_record",
                field: "doctor_id",
                id: record.doctor_id,
            });
        }
        if let Some(appointment_id) = record.appointment_id {
            if !tables.appointments.contains_key(&appointment_id) {
                return Err(StoreError::MissingReference {
                    entity: "medical_record",
                    field: "appointment_id",
                    id: appointment_id,
                });
            }
        }
        tables.medical_records.insert(record.id, record.clone());
        Ok(record)
    }

    pub async fn get_medical_record(&self, id: Uuid) -> Result<MedicalRecord, StoreError> {
        let tables = self.inner.read().await;
        tables
            .medical_records
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "medical_record", id })
    }

    pub async fn records_for_patient(&self, patient_id: Uuid) -> Vec<MedicalRecord> {
        let tables = self.inner.read().await;
        let mut records: Vec<_> = tables
            .medical_records
            .values()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Cascades to the record's prescriptions.
    pub async fn delete_medical_record(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.medical_records.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "medical_record", id });
        }
        tables.prescriptions.retain(|_, p| p.medical_record_id != id);
        tables.medical_records.remove(&id);
        Ok(())
    }

    // ==========================================================================
    // PRESCRIPTIONS
    // ==========================================================================

    pub async fn insert_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.medical_records.contains_key(&prescription.medical_record_id) {
            return Err(StoreError::MissingReference {
                entity: "prescription",
                field: "medical_record_id",
                id: prescription.medical_record_id,
            });
        }
        if !tables.medications.contains_key(&prescription.medication_id) {
            return Err(StoreError::MissingReference {
                entity: "prescription",
                field: "medication_id",
                id: prescription.medication_id,
            });
        }
        tables.prescriptions.insert(prescription.id, prescription.clone());
        Ok(prescription)
    }

    pub async fn get_prescription(&self, id: Uuid) -> Result<Prescription, StoreError> {
        let tables = self.inner.read().await;
        tables
            .prescriptions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "prescription", id })
    }

    pub async fn update_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.prescriptions.contains_key(&prescription.id) {
            return Err(StoreError::NotFound { entity: "prescription", id: prescription.id });
        }
        tables.prescriptions.insert(prescription.id, prescription.clone());
        Ok(prescription)
    }

    pub async fn prescriptions_for_record(&self, medical_record_id: Uuid) -> Vec<Prescription> {
        let tables = self.inner.read().await;
        let mut prescriptions: Vec<_> = tables
            .prescriptions
            .values()
            .filter(|p| p.medical_record_id == medical_record_id)
            .cloned()
            .collect();
        prescriptions.sort_by_key(|p| p.created_at);
        prescriptions
    }

    pub async fn delete_prescription(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if tables.prescriptions.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "prescription", id });
        }
        Ok(())
    }
}
