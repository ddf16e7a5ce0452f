use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use review_cell::{Review, ReviewError, ReviewSummary};
use shared_database::DatabaseError;
use shared_models::entity::EntityType;
use shared_models::error::AppError;
use shared_utils::media::MediaError;

pub const CATEGORIES: &str = "categories";
pub const HOSPITALS: &str = "hospitals";
pub const DOCTORS: &str = "doctors";
pub const WORKING_TIMES: &str = "working_times";
/// Priced offerings of a doctor; removed along with the doctor.
pub const DOCTOR_PACKAGES: &str = "doctor_packages";
/// Bookings against doctor packages.
pub const APPOINTMENTS: &str = "appointments";

// ==============================================================================
// CATEGORIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    pub location: Option<Location>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_ids: Option<Vec<Uuid>>,
    pub location: Option<Location>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalListQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub category_id: Option<Uuid>,
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub qualification: Option<String>,
    pub experience_years: Option<u32>,
    pub about: Option<String>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorRequest {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub qualification: Option<String>,
    pub experience_years: Option<u32>,
    pub about: Option<String>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
}

// ==============================================================================
// WORKING TIMES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingTime {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkingTimeRequest {
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
    pub day: Option<Weekday>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkingTimeQuery {
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
}

// ==============================================================================
// READ MODELS
// ==============================================================================

/// A listing row with its review aggregate flattened in.
#[derive(Debug, Clone, Serialize)]
pub struct Rated<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(flatten)]
    pub reviews: ReviewSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HospitalDetail {
    #[serde(flatten)]
    pub hospital: Hospital,
    #[serde(flatten)]
    pub summary: ReviewSummary,
    pub working_times: Vec<WorkingTime>,
    pub reviews: Vec<Review>,
    pub specialists: Vec<Doctor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDetail {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(flatten)]
    pub summary: ReviewSummary,
    pub working_times: Vec<WorkingTime>,
    pub reviews: Vec<Review>,
    pub category: Option<Category>,
    pub hospital: Option<Hospital>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectoryCounts {
    pub categories: usize,
    pub hospitals: usize,
    pub doctors: usize,
    pub doctors_per_category: BTreeMap<String, usize>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Working time not found")]
    WorkingTimeNotFound,

    #[error("Doctor has appointments and cannot be deleted")]
    DoctorHasAppointments,

    #[error("Administrator access required")]
    AdminRequired,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl DirectoryError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DirectoryError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Doctor => DirectoryError::DoctorNotFound,
            EntityType::Hospital => DirectoryError::HospitalNotFound,
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::CategoryNotFound
            | DirectoryError::HospitalNotFound
            | DirectoryError::DoctorNotFound
            | DirectoryError::WorkingTimeNotFound => AppError::NotFound(err.to_string()),
            DirectoryError::DoctorHasAppointments => AppError::BadRequest(err.to_string()),
            DirectoryError::AdminRequired => AppError::Auth(err.to_string()),
            DirectoryError::Validation { field, message } => AppError::field(&field, message),
            DirectoryError::Review(e) => e.into(),
            DirectoryError::Media(e) => e.into(),
            DirectoryError::Database(e) => e.into(),
        }
    }
}
