use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::debug;
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::Appointment;

/// Read-only conflict queries over booked appointments.
///
/// Cancelled and no-show rows are skipped everywhere here: they no longer
/// occupy their slot.
pub struct ConflictDetectionService {
    db: ClinicDatabase,
}

impl ConflictDetectionService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    /// Number of slot-occupying appointments for the doctor that start inside
    /// the given clock hour on the given date.
    pub async fn booked_in_hour(&self, doctor_id: Uuid, date: NaiveDate, hour: u32) -> i32 {
        let count = self
            .db
            .appointments_for_doctor_on(doctor_id, date)
            .await
            .iter()
            .filter(|a| a.status.occupies_slot() && a.start_time.hour() == hour)
            .count();
        debug!(
            "Doctor {} has {} booked in hour {} on {}",
            doctor_id, count, hour, date
        );
        count as i32
    }

    /// First slot-occupying appointment of the doctor overlapping the
    /// requested interval, if any.
    pub async fn find_doctor_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
    ) -> Option<Appointment> {
        self.db
            .appointments_for_doctor_on(doctor_id, date)
            .await
            .into_iter()
            .find(|a| a.status.occupies_slot() && a.overlaps_interval(start_time, duration_minutes))
    }

    /// First slot-occupying appointment of the patient overlapping the
    /// requested interval, across all doctors.
    pub async fn find_patient_conflict(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i32,
    ) -> Option<Appointment> {
        self.db
            .appointments_for_patient_on(patient_id, date)
            .await
            .into_iter()
            .find(|a| a.status.occupies_slot() && a.overlaps_interval(start_time, duration_minutes))
    }
}
