pub mod patient;

pub use patient::{Demographics, PatientService};
