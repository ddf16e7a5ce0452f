use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const PATIENTS: &str = "patients";
/// Bookings made for a patient.
pub const APPOINTMENTS: &str = "appointments";

/// Who an appointment is being booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookingFor {
    /// The account holder; demographics mirror the owning user.
    #[default]
    #[serde(rename = "self")]
    Myself,
    #[serde(rename = "other")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub booking_for: BookingFor,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub problem_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    /// Only honoured for administrators.
    pub user_id: Option<Uuid>,
    pub booking_for: Option<BookingFor>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub problem_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub booking_for: Option<BookingFor>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub problem_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("User not found")]
    OwnerNotFound,

    #[error("No patients found for this user")]
    NoneForUser,

    #[error("Not authorized to access this patient")]
    Forbidden,

    #[error("Patient has appointments and cannot be deleted")]
    HasAppointments,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl PatientError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        PatientError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound | PatientError::OwnerNotFound | PatientError::NoneForUser => {
                AppError::NotFound(err.to_string())
            }
            PatientError::Forbidden => AppError::Auth(err.to_string()),
            PatientError::HasAppointments => AppError::BadRequest(err.to_string()),
            PatientError::Validation { field, message } => AppError::field(&field, message),
            PatientError::Database(e) => e.into(),
        }
    }
}
