pub mod appointment;
pub mod booking_id;
pub mod package;

pub use appointment::AppointmentService;
pub use booking_id::generate_booking_id;
pub use package::PackageService;
