use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::request::{document_id, json_body};

use crate::models::{
    Appointment, AppointmentDetail, AppointmentError, AppointmentListQuery, BookAppointmentRequest,
    CancelAppointmentRequest, DoctorPackage, PackageListQuery, PackageRequest, UpdateAppointmentRequest,
};
use crate::services::{AppointmentService, PackageService};

fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin {
        return Err(AppointmentError::AdminRequired.into());
    }
    Ok(())
}

// ==============================================================================
// DOCTOR PACKAGES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_packages(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PackageListQuery>,
) -> Result<Json<Vec<DoctorPackage>>, AppError> {
    let service = PackageService::new(&state);
    Ok(Json(service.list(&query).await?))
}

#[axum::debug_handler]
pub async fn get_package(
    State(state): State<Arc<AppConfig>>,
    Path(package_id): Path<String>,
) -> Result<Json<DoctorPackage>, AppError> {
    let id = document_id(&package_id, "Package")?;
    let service = PackageService::new(&state);
    Ok(Json(service.get(id).await?))
}

#[axum::debug_handler]
pub async fn create_package(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PackageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DoctorPackage>), AppError> {
    require_admin(&user)?;
    let request = json_body(payload)?;
    let service = PackageService::new(&state);
    Ok((StatusCode::CREATED, Json(service.create(request).await?)))
}

#[axum::debug_handler]
pub async fn update_package(
    State(state): State<Arc<AppConfig>>,
    Path(package_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PackageRequest>, JsonRejection>,
) -> Result<Json<DoctorPackage>, AppError> {
    require_admin(&user)?;
    let id = document_id(&package_id, "Package")?;
    let request = json_body(payload)?;
    let service = PackageService::new(&state);
    Ok(Json(service.update(id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_package(
    State(state): State<Arc<AppConfig>>,
    Path(package_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let id = document_id(&package_id, "Package")?;
    let service = PackageService::new(&state);
    service.delete(id).await?;
    Ok(Json(json!({ "message": "Package deleted successfully" })))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let request = json_body(payload)?;
    let service = AppointmentService::new(&state);
    let appointment = service.book(request, &user).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = AppointmentService::new(&state);
    Ok(Json(service.list(&query, &user).await?))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AppointmentDetail>, AppError> {
    let id = document_id(&appointment_id, "Appointment")?;
    let service = AppointmentService::new(&state);
    Ok(Json(service.detail(id, &user).await?))
}

#[axum::debug_handler]
pub async fn get_by_booking_id(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AppointmentDetail>, AppError> {
    let service = AppointmentService::new(&state);
    Ok(Json(service.by_booking_id(&booking_id, &user).await?))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<Json<Appointment>, AppError> {
    let id = document_id(&appointment_id, "Appointment")?;
    let request = json_body(payload)?;
    let service = AppointmentService::new(&state);
    Ok(Json(service.update(id, request, &user).await?))
}

/// The body is optional; a bare POST cancels without a reason.
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CancelAppointmentRequest>, JsonRejection>,
) -> Result<Json<Appointment>, AppError> {
    let id = document_id(&appointment_id, "Appointment")?;
    let request = match payload {
        Err(JsonRejection::MissingJsonContentType(_)) => CancelAppointmentRequest::default(),
        other => json_body(other)?,
    };
    let service = AppointmentService::new(&state);
    Ok(Json(service.cancel(id, request.reason, &user).await?))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Appointment>, AppError> {
    require_admin(&user)?;
    let id = document_id(&appointment_id, "Appointment")?;
    let service = AppointmentService::new(&state);
    Ok(Json(service.complete(id, &user).await?))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    let id = document_id(&appointment_id, "Appointment")?;
    let service = AppointmentService::new(&state);
    service.delete(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
