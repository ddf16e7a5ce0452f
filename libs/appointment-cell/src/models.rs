use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use directory_cell::Doctor;
use patient_cell::{Patient, PatientError};
use shared_database::DatabaseError;
use shared_models::error::AppError;

pub use directory_cell::models::DOCTOR_PACKAGES;
pub use patient_cell::models::APPOINTMENTS;

pub const DEFAULT_DURATION_MINUTES: i64 = 15;

// ==============================================================================
// DOCTOR PACKAGES
// ==============================================================================

/// How a package is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    Messaging,
    VoiceCall,
    VideoCall,
    InPerson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorPackage {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub duration_minutes: u32,
    pub package: PackageKind,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageRequest {
    pub doctor_id: Option<Uuid>,
    pub duration_minutes: Option<i64>,
    pub package: Option<PackageKind>,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageListQuery {
    pub doctor_id: Option<Uuid>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Upcoming => "upcoming",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Only upcoming appointments move, and they never come back.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Upcoming, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Upcoming, AppointmentStatus::Completed)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub booking_id: String,
    pub patient_id: Uuid,
    pub package_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub patient_id: Option<Uuid>,
}

/// An appointment with its patient, package and doctor inlined.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<Patient>,
    pub package: Option<DoctorPackage>,
    pub doctor: Option<Doctor>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Package not found")]
    PackageNotFound,

    #[error("Package has appointments and cannot be deleted")]
    PackageInUse,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Not authorized to access this appointment")]
    Forbidden,

    #[error("Administrator access required")]
    AdminRequired,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AppointmentError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppointmentError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::PackageNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::AlreadyCancelled
            | AppointmentError::InvalidStatusTransition(_)
            | AppointmentError::PackageInUse => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::Forbidden | AppointmentError::AdminRequired => AppError::Auth(err.to_string()),
            AppointmentError::Validation { field, message } => AppError::field(&field, message),
            AppointmentError::Patient(e) => e.into(),
            AppointmentError::Database(e) => e.into(),
        }
    }
}
