pub mod store;

pub use store::ClinicDatabase;
