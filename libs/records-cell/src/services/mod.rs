pub mod prescriptions;
pub mod records;

pub use prescriptions::PrescriptionService;
pub use records::MedicalRecordService;
