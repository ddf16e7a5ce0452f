pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Category, DirectoryError, Doctor, Hospital, WorkingTime, DOCTORS, HOSPITALS};
pub use router::directory_routes;
pub use services::{DoctorService, HospitalService};
