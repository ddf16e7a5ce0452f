pub mod category;
pub mod counts;
pub mod doctor;
pub mod entity;
pub mod hospital;
pub mod text;
pub mod working_time;

pub use category::CategoryService;
pub use counts::CountService;
pub use doctor::DoctorService;
pub use hospital::HospitalService;
pub use working_time::WorkingTimeService;
