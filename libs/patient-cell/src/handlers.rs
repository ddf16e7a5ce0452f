use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::request::{document_id, json_body};

use crate::models::{CreatePatientRequest, Patient, PatientListQuery, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    let request = json_body(payload)?;
    let service = PatientService::new(&state);
    let patient = service.create_patient(request, &user).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let service = PatientService::new(&state);
    Ok(Json(service.list_patients(&user, query.user_id).await?))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Patient>, AppError> {
    let id = document_id(&patient_id, "Patient")?;
    let service = PatientService::new(&state);
    Ok(Json(service.get_patient(id, &user).await?))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdatePatientRequest>, JsonRejection>,
) -> Result<Json<Patient>, AppError> {
    let id = document_id(&patient_id, "Patient")?;
    let request = json_body(payload)?;
    let service = PatientService::new(&state);
    Ok(Json(service.update_patient(id, request, &user).await?))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    let id = document_id(&patient_id, "Patient")?;
    let service = PatientService::new(&state);
    service.delete_patient(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn patients_by_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let owner_id = document_id(&user_id, "User")?;
    let service = PatientService::new(&state);
    Ok(Json(service.patients_for_user(owner_id, &user).await?))
}
