pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentError, AppointmentStatus, DoctorPackage, PackageKind};
pub use router::{appointment_routes, package_routes};
pub use services::{AppointmentService, PackageService};
