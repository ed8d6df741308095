pub mod patient;

pub use patient::PatientRegistryService;
