use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicDatabase;
use shared_models::entities::{DayOfWeek, DoctorSchedule};

use crate::models::{
    AvailabilityWindow, CreateScheduleRequest, DoctorError, UpdateScheduleRequest,
};

/// Availability Model: recurring weekly windows per doctor.
///
/// Schedule reads are read-mostly, so resolved windows are cached per
/// (doctor, day) and invalidated on every schedule write for that key.
pub struct AvailabilityService {
    db: ClinicDatabase,
    window_cache: RwLock<HashMap<(Uuid, DayOfWeek), Vec<AvailabilityWindow>>>,
}

impl AvailabilityService {
    pub fn new(db: ClinicDatabase) -> Self {
        Self {
            db,
            window_cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_schedule(
        &self,
        doctor_id: Uuid,
        request: CreateScheduleRequest,
    ) -> Result<DoctorSchedule, DoctorError> {
        self.validate_window(request.start_time, request.end_time, request.max_patients_per_hour)?;
        self.check_window_overlap(
            doctor_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
            None,
        )
        .await?;

        let now = Utc::now();
        let schedule = DoctorSchedule {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            max_patients_per_hour: request.max_patients_per_hour,
            is_available: request.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let schedule = self.db.insert_schedule(schedule).await?;
        self.invalidate(doctor_id, request.day_of_week).await;
        info!(
            "Schedule {} created for doctor {} on {} {}-{}",
            schedule.id, doctor_id, schedule.day_of_week, schedule.start_time, schedule.end_time
        );
        Ok(schedule)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<DoctorSchedule, DoctorError> {
        let mut schedule = self.db.get_schedule(schedule_id).await?;

        if let Some(start_time) = request.start_time {
            schedule.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            schedule.end_time = end_time;
        }
        if let Some(max_per_hour) = request.max_patients_per_hour {
            schedule.max_patients_per_hour = max_per_hour;
        }
        if let Some(is_available) = request.is_available {
            schedule.is_available = is_available;
        }

        self.validate_window(schedule.start_time, schedule.end_time, schedule.max_patients_per_hour)?;
        self.check_window_overlap(
            schedule.doctor_id,
            schedule.day_of_week,
            schedule.start_time,
            schedule.end_time,
            Some(schedule_id),
        )
        .await?;

        schedule.updated_at = Utc::now();
        let schedule = self.db.update_schedule(schedule).await?;
        self.invalidate(schedule.doctor_id, schedule.day_of_week).await;
        Ok(schedule)
    }

    pub async fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), DoctorError> {
        let schedule = self.db.get_schedule(schedule_id).await?;
        self.db.delete_schedule(schedule_id).await?;
        self.invalidate(schedule.doctor_id, schedule.day_of_week).await;
        info!("Schedule {} deleted", schedule_id);
        Ok(())
    }

    pub async fn schedules_for_doctor(&self, doctor_id: Uuid) -> Vec<DoctorSchedule> {
        self.db.schedules_for_doctor(doctor_id).await
    }

    /// Ordered windows for a doctor on one weekday, unavailable windows
    /// included.
    ///
    /// On a miss the write lock is held across the store read and the
    /// insert; a concurrent `invalidate` then serializes after the insert
    /// and cannot be lost, so a stale snapshot never outlives the schedule
    /// write that obsoleted it.
    pub async fn windows_for(&self, doctor_id: Uuid, day: DayOfWeek) -> Vec<AvailabilityWindow> {
        if let Some(windows) = self.window_cache.read().await.get(&(doctor_id, day)) {
            return windows.clone();
        }

        let mut cache = self.window_cache.write().await;
        if let Some(windows) = cache.get(&(doctor_id, day)) {
            return windows.clone();
        }

        let windows: Vec<AvailabilityWindow> = self
            .db
            .schedules_for_doctor_day(doctor_id, day)
            .await
            .into_iter()
            .map(|s| AvailabilityWindow {
                start_time: s.start_time,
                end_time: s.end_time,
                max_per_hour: s.max_patients_per_hour,
                is_available: s.is_available,
            })
            .collect();

        debug!("Caching {} windows for doctor {} on {}", windows.len(), doctor_id, day);
        cache.insert((doctor_id, day), windows.clone());
        windows
    }

    /// The available window that fully contains [time, time + duration) on
    /// the given date, if any.
    pub async fn window_for(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
    ) -> Option<AvailabilityWindow> {
        let day = DayOfWeek::from_date(date);
        self.windows_for(doctor_id, day)
            .await
            .into_iter()
            .find(|w| w.is_available && w.contains_interval(time, duration_minutes))
    }

    pub async fn is_within_window(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
    ) -> bool {
        self.window_for(doctor_id, date, time, duration_minutes)
            .await
            .is_some()
    }

    async fn invalidate(&self, doctor_id: Uuid, day: DayOfWeek) {
        self.window_cache.write().await.remove(&(doctor_id, day));
    }

    fn validate_window(
        &self,
        start_time: NaiveTime,
        end_time: NaiveTime,
        max_per_hour: i32,
    ) -> Result<(), DoctorError> {
        if start_time >= end_time {
            return Err(DoctorError::InvalidTimeRange);
        }
        if max_per_hour <= 0 {
            return Err(DoctorError::ValidationError(
                "Max patients per hour must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Start-time uniqueness in storage does not prevent two windows with
    /// different starts from overlapping, so the range check is explicit.
    async fn check_window_overlap(
        &self,
        doctor_id: Uuid,
        day: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<(), DoctorError> {
        let existing = self.db.schedules_for_doctor_day(doctor_id, day).await;
        for schedule in existing {
            if Some(schedule.id) == exclude_id {
                continue;
            }
            if schedule.overlaps(start_time, end_time) {
                return Err(DoctorError::ScheduleOverlap {
                    day,
                    start: schedule.start_time,
                    end: schedule.end_time,
                });
            }
        }
        Ok(())
    }
}
