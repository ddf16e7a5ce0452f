use axum::{extract::rejection::JsonRejection, Json};
use uuid::Uuid;

use shared_models::error::AppError;

/// Unwraps a JSON body, reporting malformed or incomplete payloads as 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// Parses a document id from a path segment. Ids that cannot exist are reported
/// the same way as ids that do not exist.
pub fn document_id(raw: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{} not found", label)))
}
