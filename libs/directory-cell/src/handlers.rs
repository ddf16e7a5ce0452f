use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::media::FileUpload;
use shared_utils::request::{document_id, json_body};

use crate::models::{
    Category, CategoryRequest, DirectoryCounts, DirectoryError, Doctor, DoctorDetail, DoctorListQuery,
    DoctorRequest, Hospital, HospitalDetail, HospitalListQuery, HospitalRequest, Rated, WorkingTime,
    WorkingTimeQuery, WorkingTimeRequest,
};
use crate::services::{CategoryService, CountService, DoctorService, HospitalService, WorkingTimeService};

fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin {
        return Err(DirectoryError::AdminRequired.into());
    }
    Ok(())
}

// ==============================================================================
// CATEGORIES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_categories(State(state): State<Arc<AppConfig>>) -> Result<Json<Vec<Category>>, AppError> {
    let service = CategoryService::new(&state);
    Ok(Json(service.list().await?))
}

#[axum::debug_handler]
pub async fn get_category(
    State(state): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
) -> Result<Json<Category>, AppError> {
    let id = document_id(&category_id, "Category")?;
    let service = CategoryService::new(&state);
    Ok(Json(service.get(id).await?))
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_admin(&user)?;
    let request = json_body(payload)?;
    let service = CategoryService::new(&state);
    Ok((StatusCode::CREATED, Json(service.create(request).await?)))
}

#[axum::debug_handler]
pub async fn update_category(
    State(state): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<Category>, AppError> {
    require_admin(&user)?;
    let id = document_id(&category_id, "Category")?;
    let request = json_body(payload)?;
    let service = CategoryService::new(&state);
    Ok(Json(service.update(id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(state): State<Arc<AppConfig>>,
    Path(category_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    let id = document_id(&category_id, "Category")?;
    let service = CategoryService::new(&state);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<HospitalListQuery>,
) -> Result<Json<Vec<Rated<Hospital>>>, AppError> {
    let service = HospitalService::new(&state);
    Ok(Json(service.list(&query).await?))
}

#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<HospitalDetail>, AppError> {
    let id = document_id(&hospital_id, "Hospital")?;
    let service = HospitalService::new(&state);
    Ok(Json(service.detail(id).await?))
}

#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<HospitalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Hospital>), AppError> {
    require_admin(&user)?;
    let request = json_body(payload)?;
    let service = HospitalService::new(&state);
    Ok((StatusCode::CREATED, Json(service.create(request).await?)))
}

#[axum::debug_handler]
pub async fn update_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<HospitalRequest>, JsonRejection>,
) -> Result<Json<Hospital>, AppError> {
    require_admin(&user)?;
    let id = document_id(&hospital_id, "Hospital")?;
    let request = json_body(payload)?;
    let service = HospitalService::new(&state);
    Ok(Json(service.update(id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    let id = document_id(&hospital_id, "Hospital")?;
    let service = HospitalService::new(&state);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn upload_hospital_image(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<FileUpload>, JsonRejection>,
) -> Result<Json<Hospital>, AppError> {
    require_admin(&user)?;
    let id = document_id(&hospital_id, "Hospital")?;
    let upload = json_body(payload)?;
    let service = HospitalService::new(&state);
    Ok(Json(service.upload_image(id, &upload).await?))
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Vec<Rated<Doctor>>>, AppError> {
    let service = DoctorService::new(&state);
    Ok(Json(service.list(&query).await?))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<DoctorDetail>, AppError> {
    let id = document_id(&doctor_id, "Doctor")?;
    let service = DoctorService::new(&state);
    Ok(Json(service.detail(id).await?))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<DoctorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Doctor>), AppError> {
    require_admin(&user)?;
    let request = json_body(payload)?;
    let service = DoctorService::new(&state);
    Ok((StatusCode::CREATED, Json(service.create(request).await?)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<DoctorRequest>, JsonRejection>,
) -> Result<Json<Doctor>, AppError> {
    require_admin(&user)?;
    let id = document_id(&doctor_id, "Doctor")?;
    let request = json_body(payload)?;
    let service = DoctorService::new(&state);
    Ok(Json(service.update(id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    let id = document_id(&doctor_id, "Doctor")?;
    let service = DoctorService::new(&state);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn upload_doctor_image(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<FileUpload>, JsonRejection>,
) -> Result<Json<Doctor>, AppError> {
    require_admin(&user)?;
    let id = document_id(&doctor_id, "Doctor")?;
    let upload = json_body(payload)?;
    let service = DoctorService::new(&state);
    Ok(Json(service.upload_image(id, &upload).await?))
}

// ==============================================================================
// WORKING TIMES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_working_times(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<WorkingTimeQuery>,
) -> Result<Json<Vec<WorkingTime>>, AppError> {
    let service = WorkingTimeService::new(&state);
    Ok(Json(service.list(&query).await?))
}

#[axum::debug_handler]
pub async fn get_working_time(
    State(state): State<Arc<AppConfig>>,
    Path(working_time_id): Path<String>,
) -> Result<Json<WorkingTime>, AppError> {
    let id = document_id(&working_time_id, "Working time")?;
    let service = WorkingTimeService::new(&state);
    Ok(Json(service.get(id).await?))
}

#[axum::debug_handler]
pub async fn create_working_time(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<WorkingTimeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkingTime>), AppError> {
    require_admin(&user)?;
    let request = json_body(payload)?;
    let service = WorkingTimeService::new(&state);
    Ok((StatusCode::CREATED, Json(service.create(request).await?)))
}

#[axum::debug_handler]
pub async fn update_working_time(
    State(state): State<Arc<AppConfig>>,
    Path(working_time_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<WorkingTimeRequest>, JsonRejection>,
) -> Result<Json<WorkingTime>, AppError> {
    require_admin(&user)?;
    let id = document_id(&working_time_id, "Working time")?;
    let request = json_body(payload)?;
    let service = WorkingTimeService::new(&state);
    Ok(Json(service.update(id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_working_time(
    State(state): State<Arc<AppConfig>>,
    Path(working_time_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    require_admin(&user)?;
    let id = document_id(&working_time_id, "Working time")?;
    let service = WorkingTimeService::new(&state);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// COUNTS
// ==============================================================================

#[axum::debug_handler]
pub async fn directory_counts(State(state): State<Arc<AppConfig>>) -> Result<Json<DirectoryCounts>, AppError> {
    let service = CountService::new(&state);
    Ok(Json(service.counts().await?))
}
