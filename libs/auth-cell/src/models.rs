use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use review_cell::ReviewError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const USERS: &str = "users";

fn default_true() -> bool {
    true
}

/// Stored account. Credential and OTP fields are never serialized out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub location: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(skip_serializing, default)]
    pub otp: Option<String>,
    #[serde(skip_serializing, default)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl User {
    /// Whole years since `dob`, if known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.dob.and_then(|dob| today.years_since(dob))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerToken {
    #[serde(rename = "type")]
    pub token_type: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub token: BearerToken,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Current password and new password are required")]
    MissingPasswords,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("New password cannot be the same as the old password")]
    PasswordReuse,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Favorites(#[from] ReviewError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AccountError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AccountError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UsernameTaken => AppError::field("username", err.to_string()),
            AccountError::EmailTaken => AppError::field("email", err.to_string()),
            AccountError::Validation { field, message } => AppError::field(&field, message),
            AccountError::UserNotFound => AppError::NotFound(err.to_string()),
            AccountError::InvalidCredentials
            | AccountError::InvalidOtp
            | AccountError::AlreadyVerified
            | AccountError::MissingPasswords
            | AccountError::IncorrectPassword
            | AccountError::PasswordReuse => AppError::BadRequest(err.to_string()),
            AccountError::Hashing(msg) | AccountError::Token(msg) => AppError::Internal(msg),
            AccountError::Favorites(e) => e.into(),
            AccountError::Database(e) => e.into(),
        }
    }
}
