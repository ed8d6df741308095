use std::sync::Arc;

use chrono::{Duration, Timelike, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::AvailabilityService;
use shared_config::AppConfig;
use shared_database::ClinicDatabase;
use shared_models::entities::{Appointment, AppointmentStatus};

use crate::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStats, BookAppointmentRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::consistency::DoctorSlotLocks;

/// Booking engine.
///
/// A request is checked in a fixed order and the first failed check decides
/// the error: field validation, booking horizon, party status, availability
/// window, hourly capacity, doctor overlap, patient overlap. Checks after the
/// window lookup run under the doctor's booking lock so concurrent requests
/// for the same doctor cannot both pass.
pub struct BookingService {
    db: ClinicDatabase,
    availability: Arc<AvailabilityService>,
    conflicts: ConflictDetectionService,
    locks: DoctorSlotLocks,
    max_advance_booking_days: i64,
    default_duration_minutes: i32,
}

impl BookingService {
    pub fn new(db: ClinicDatabase, availability: Arc<AvailabilityService>, config: &AppConfig) -> Self {
        Self {
            conflicts: ConflictDetectionService::new(db.clone()),
            locks: DoctorSlotLocks::new(),
            db,
            availability,
            max_advance_booking_days: config.max_advance_booking_days,
            default_duration_minutes: config.default_duration_minutes,
        }
    }

    pub async fn request_booking(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let duration_minutes = request
            .duration_minutes
            .unwrap_or(self.default_duration_minutes);
        if duration_minutes <= 0 {
            return Err(AppointmentError::ValidationError(
                "Appointment duration must be positive".to_string(),
            ));
        }
        if let Some(fee) = request.fee_override {
            if fee < 0.0 {
                return Err(AppointmentError::ValidationError(
                    "Fee override must not be negative".to_string(),
                ));
            }
        }

        let today = Utc::now().date_naive();
        if request.date < today {
            return Err(AppointmentError::ValidationError(
                "Appointments cannot be booked in the past".to_string(),
            ));
        }
        if request.date > today + Duration::days(self.max_advance_booking_days) {
            return Err(AppointmentError::ValidationError(format!(
                "Appointments can be booked at most {} days ahead",
                self.max_advance_booking_days
            )));
        }

        let doctor = self.db.get_doctor(request.doctor_id).await?;
        if !doctor.is_active {
            return Err(AppointmentError::DoctorInactive);
        }
        let patient = self.db.get_patient(request.patient_id).await?;
        if !patient.is_active {
            return Err(AppointmentError::PatientInactive);
        }

        // Window, capacity and overlap checks all read the same booked rows,
        // so they run under the doctor's booking lock.
        let _guard = self.locks.try_acquire(doctor.id)?;

        let window = self
            .availability
            .window_for(doctor.id, request.date, request.start_time, duration_minutes)
            .await
            .ok_or(AppointmentError::OutsideAvailability {
                date: request.date,
                start_time: request.start_time,
            })?;

        let booked = self
            .conflicts
            .booked_in_hour(doctor.id, request.date, request.start_time.hour())
            .await;
        if booked >= window.max_per_hour {
            warn!(
                "Hourly capacity hit for doctor {} on {} hour {}",
                doctor.id,
                request.date,
                request.start_time.hour()
            );
            return Err(AppointmentError::CapacityExceeded {
                max_per_hour: window.max_per_hour,
                booked,
            });
        }

        if let Some(conflict) = self
            .conflicts
            .find_doctor_conflict(doctor.id, request.date, request.start_time, duration_minutes)
            .await
        {
            return Err(AppointmentError::SlotConflict {
                conflicting_appointment: conflict.id,
            });
        }

        if let Some(conflict) = self
            .conflicts
            .find_patient_conflict(patient.id, request.date, request.start_time, duration_minutes)
            .await
        {
            return Err(AppointmentError::PatientDoubleBooked {
                conflicting_appointment: conflict.id,
            });
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            appointment_number: generate_appointment_number(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: request.date,
            start_time: request.start_time,
            duration_minutes,
            appointment_type: request.appointment_type,
            status: AppointmentStatus::Scheduled,
            reason: request.reason,
            fee: request.fee_override.unwrap_or(doctor.consultation_fee),
            booked_at: now,
            updated_at: now,
        };

        let appointment = self.db.insert_appointment(appointment).await?;
        info!(
            "Appointment {} booked for patient {} with doctor {} on {} at {}",
            appointment.appointment_number,
            patient.patient_number,
            doctor.doctor_number,
            appointment.date,
            appointment.start_time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        Ok(self.db.get_appointment(id).await?)
    }

    /// All appointments matching every filter in the query, ordered by date
    /// and start time.
    pub async fn search_appointments(&self, query: &AppointmentSearchQuery) -> Vec<Appointment> {
        let appointments: Vec<Appointment> = self
            .db
            .list_appointments()
            .await
            .into_iter()
            .filter(|a| query.patient_id.map_or(true, |id| a.patient_id == id))
            .filter(|a| query.doctor_id.map_or(true, |id| a.doctor_id == id))
            .filter(|a| query.status.map_or(true, |s| a.status == s))
            .filter(|a| query.from_date.map_or(true, |d| a.date >= d))
            .filter(|a| query.to_date.map_or(true, |d| a.date <= d))
            .collect();
        debug!("Appointment search matched {} rows", appointments.len());
        appointments
    }

    pub async fn appointment_stats(&self, query: &AppointmentSearchQuery) -> AppointmentStats {
        let appointments = self.search_appointments(query).await;

        let completed: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .collect();
        let average_completed_duration_minutes = if completed.is_empty() {
            0
        } else {
            completed.iter().map(|a| a.duration_minutes).sum::<i32>() / completed.len() as i32
        };

        AppointmentStats {
            total_appointments: appointments.len() as i32,
            completed_appointments: completed.len() as i32,
            cancelled_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Cancelled)
                .count() as i32,
            no_show_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::NoShow)
                .count() as i32,
            average_completed_duration_minutes,
        }
    }
}

fn generate_appointment_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("APT-{}", suffix)
}
