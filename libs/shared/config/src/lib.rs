use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Furthest ahead an appointment may be booked, in days.
    pub max_advance_booking_days: i64,
    /// Duration applied when a booking request does not specify one.
    pub default_duration_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            max_advance_booking_days: read_var("CLINIC_MAX_ADVANCE_BOOKING_DAYS", 90),
            default_duration_minutes: read_var("CLINIC_DEFAULT_DURATION_MINUTES", 30),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_advance_booking_days: 90,
            default_duration_minutes: 30,
        }
    }
}

fn read_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("{} has invalid value {:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
