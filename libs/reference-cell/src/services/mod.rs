pub mod departments;
pub mod medications;

pub use departments::DepartmentService;
pub use medications::MedicationService;
