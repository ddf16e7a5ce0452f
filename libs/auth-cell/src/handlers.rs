use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token as decode_token;
use shared_utils::request::{document_id, json_body};

use crate::models::{
    ChangePasswordRequest, EmailRequest, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, UpdateUserRequest, User, VerifyOtpRequest,
};
use crate::services::AccountService;

fn ensure_self_or_admin(user: &AuthUser, target: &str) -> Result<(), AppError> {
    if !user.can_access(target) {
        return Err(AppError::Auth("Not authorized to access this account".to_string()));
    }
    Ok(())
}

// ==============================================================================
// TOKEN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn verify_token(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers)?;
    let valid = decode_token(&token, &state).is_ok();
    Ok(Json(json!({ "valid": valid })))
}

#[axum::debug_handler]
pub async fn validate_token(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let user = decode_token(&token, &state).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        username: user.username,
        email: user.email,
    }))
}

// ==============================================================================
// PUBLIC ACCOUNT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    let user = service.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    Ok(Json(service.login(request).await?))
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    service.verify_otp(request).await?;
    Ok(Json(json!({ "message": "Email verified successfully" })))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    service.forgot_password(request.email).await?;
    Ok(Json(json!({ "message": "OTP sent to your email" })))
}

#[axum::debug_handler]
pub async fn resend_otp(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    service.resend_otp(request.email).await?;
    Ok(Json(json!({ "message": "OTP resent successfully" })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<Arc<AppConfig>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(payload)?;
    let service = AccountService::new(&state);
    service.reset_password(request).await?;
    Ok(Json(json!({ "message": "Password reset successfully" })))
}

// ==============================================================================
// PROTECTED ACCOUNT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<User>>, AppError> {
    if !user.is_admin {
        return Err(AppError::Auth("Only administrators can list users".to_string()));
    }

    let service = AccountService::new(&state);
    Ok(Json(service.list_users().await?))
}

#[axum::debug_handler]
pub async fn get_current_user(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user_id = document_id(&user.id, "User")?;
    let service = AccountService::new(&state);
    Ok(Json(service.get_user(user_id).await?))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let id = document_id(&user_id, "User")?;
    ensure_self_or_admin(&user, &id.to_string())?;

    let service = AccountService::new(&state);
    Ok(Json(service.get_user(id).await?))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let id = document_id(&user_id, "User")?;
    ensure_self_or_admin(&user, &id.to_string())?;
    let request = json_body(payload)?;

    debug!("User {} updating account {}", user.id, id);

    let service = AccountService::new(&state);
    Ok(Json(service.update_user(id, request, &user).await?))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    let id = document_id(&user_id, "User")?;
    ensure_self_or_admin(&user, &id.to_string())?;

    let service = AccountService::new(&state);
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = json_body(payload)?;
    let user_id = document_id(&user.id, "User")?;

    let service = AccountService::new(&state);
    service.change_password(user_id, request).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
