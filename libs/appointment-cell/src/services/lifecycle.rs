use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::{Appointment, AppointmentStatus};

use crate::models::AppointmentError;

/// Appointment status state machine.
///
/// Terminal states keep the row for history and reporting; cancelled and
/// no-show rows stop occupying their slot so the time can be rebooked.
pub struct AppointmentLifecycleService {
    db: ClinicDatabase,
}

impl AppointmentLifecycleService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self { db }
    }

    pub async fn confirm(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Confirmed).await
    }

    pub async fn check_in(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::InProgress).await
    }

    pub async fn complete(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Completed).await
    }

    pub async fn cancel(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::NoShow).await
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        to: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.db.get_appointment(appointment_id).await?;
        let from = appointment.status;

        if !valid_transitions(from).contains(&to) {
            return Err(AppointmentError::InvalidStatusTransition { from, to });
        }

        appointment.status = to;
        appointment.updated_at = Utc::now();
        let appointment = self.db.update_appointment(appointment).await?;
        info!(
            "Appointment {} moved {} -> {}",
            appointment.appointment_number, from, to
        );
        Ok(appointment)
    }
}

pub fn valid_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match from {
        Scheduled => &[Confirmed, Cancelled, NoShow],
        Confirmed => &[InProgress, Cancelled, NoShow],
        InProgress => &[Completed],
        Completed | Cancelled | NoShow => &[],
    }
}
