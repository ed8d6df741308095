pub mod booking;
pub mod conflict;
pub mod consistency;
pub mod lifecycle;

pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use consistency::DoctorSlotLocks;
pub use lifecycle::AppointmentLifecycleService;
