use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Database authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode database payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Database returned no documents for {0}")]
    EmptyResponse(String),

    #[error("Invalid header value for database request")]
    InvalidHeader,
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}
