use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::models::AppointmentError;

/// Per-doctor booking locks.
///
/// The store is atomic per call, but a booking is a read-check-write sequence
/// over several calls. Holding the doctor's lock across that sequence keeps
/// two concurrent bookings for the same doctor from both passing the conflict
/// checks. Contention is surfaced to the caller instead of queued.
#[derive(Default)]
pub struct DoctorSlotLocks {
    locks: std::sync::Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl DoctorSlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, doctor_id: Uuid) -> Result<OwnedMutexGuard<()>, AppointmentError> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(doctor_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        match lock.try_lock_owned() {
            Ok(guard) => Ok(guard),
            Err(_) => {
                debug!("Booking lock for doctor {} is contended", doctor_id);
                Err(AppointmentError::ConcurrentModification)
            }
        }
    }
}
