use std::collections::HashSet;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use review_cell::{Favorite, FavoriteService};
use shared_config::AppConfig;
use shared_database::{DatabaseClient, Query};
use shared_models::auth::AuthUser;
use shared_utils::jwt::issue_token;
use shared_utils::validation::{is_valid_email, max_length};

use crate::models::{
    AccountError, BearerToken, ChangePasswordRequest, LoginRequest, LoginResponse, LoginUser,
    RegisterRequest, ResetPasswordRequest, UpdateUserRequest, User, VerifyOtpRequest, USERS,
};
use crate::services::email::{mailer_for, EmailMessage, Mailer};
use crate::services::otp::{generate_otp, otp_expiry, otp_matches};
use crate::services::password::{hash_password, validate_new_password, verify_password};

type Result<T> = std::result::Result<T, AccountError>;

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AccountError::validation(field, "This field is required.")),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn checked_email(value: Option<String>) -> Result<String> {
    let email = normalize_email(&required("email", value)?);
    if !is_valid_email(&email) {
        return Err(AccountError::validation("email", "Enter a valid email address."));
    }
    Ok(email)
}

fn checked_username(value: Option<String>) -> Result<String> {
    let username = required("username", value)?;
    max_length("username", &username, 100)
        .map_err(|_| AccountError::validation("username", "Ensure this field has no more than 100 characters."))?;
    Ok(username)
}

pub struct AccountService {
    db: DatabaseClient,
    config: AppConfig,
    mailer: Box<dyn Mailer>,
    favorites: FavoriteService,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_mailer(config, mailer_for(config))
    }

    pub fn with_mailer(config: &AppConfig, mailer: Box<dyn Mailer>) -> Self {
        Self {
            db: DatabaseClient::new(config),
            config: config.clone(),
            mailer,
            favorites: FavoriteService::new(config),
        }
    }

    /// Delivery failures are logged; they never undo the caller's write.
    async fn dispatch(&self, message: EmailMessage) {
        if let Err(e) = self.mailer.send(&message).await {
            warn!("Failed to send '{}' to {}: {}", message.subject, message.to, e);
        }
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool> {
        let mut query = Query::new().eq("username", username);
        if let Some(id) = except {
            query = query.neq("id", id);
        }
        Ok(self.db.exists(USERS, &query).await?)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
        let mut query = Query::new().eq("email", email);
        if let Some(id) = except {
            query = query.neq("id", id);
        }
        Ok(self.db.exists(USERS, &query).await?)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let username = checked_username(request.username)?;
        let email = checked_email(request.email)?;
        let password = required("password", request.password)?;
        validate_new_password("password", &password)?;

        debug!("Registering new user: {}", username);

        if self.username_taken(&username, None).await? {
            return Err(AccountError::UsernameTaken);
        }
        if self.email_taken(&email, None).await? {
            return Err(AccountError::EmailTaken);
        }

        let now = Utc::now();
        let otp = generate_otp();
        let document = json!({
            "id": Uuid::new_v4(),
            "username": username,
            "email": email,
            "password": hash_password(&password)?,
            "phone_number": request.phone_number,
            "dob": request.dob,
            "gender": request.gender,
            "location": request.location,
            "is_active": true,
            "is_admin": false,
            "is_email_verified": false,
            "otp": otp,
            "otp_expires_at": otp_expiry(now, self.config.otp_ttl_minutes).to_rfc3339(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
            "updated_by": null
        });

        let user: User = self.db.insert(USERS, &document).await?;
        info!("User {} registered", user.id);

        self.dispatch(EmailMessage::otp(&user.email, &otp)).await;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.db.select(USERS, &Query::new().order("created_at.desc")).await?)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        debug!("Fetching user: {}", user_id);
        self.db
            .select_one(USERS, &Query::new().eq("id", user_id))
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .db
            .select_one(USERS, &Query::new().eq("email", normalize_email(email)))
            .await?)
    }

    async fn require_by_email(&self, email: Option<String>) -> Result<User> {
        let email = required("email", email)?;
        self.find_by_email(&email).await?.ok_or(AccountError::UserNotFound)
    }

    async fn patch_user(&self, user_id: Uuid, changes: serde_json::Map<String, Value>) -> Result<User> {
        let mut changes = changes;
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let mut rows: Vec<User> = self
            .db
            .update(USERS, &Query::new().eq("id", user_id), Value::Object(changes))
            .await?;

        if rows.is_empty() {
            return Err(AccountError::UserNotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub async fn update_user(&self, user_id: Uuid, request: UpdateUserRequest, actor: &AuthUser) -> Result<User> {
        debug!("Updating user: {}", user_id);

        let mut update_data = serde_json::Map::new();

        if let Some(username) = request.username {
            let username = checked_username(Some(username))?;
            if self.username_taken(&username, Some(user_id)).await? {
                return Err(AccountError::UsernameTaken);
            }
            update_data.insert("username".to_string(), json!(username));
        }
        if let Some(email) = request.email {
            let email = checked_email(Some(email))?;
            if self.email_taken(&email, Some(user_id)).await? {
                return Err(AccountError::EmailTaken);
            }
            update_data.insert("email".to_string(), json!(email));
            // A new address has to be verified again
            update_data.insert("is_email_verified".to_string(), json!(false));
        }
        if let Some(phone_number) = request.phone_number {
            max_length("phone_number", &phone_number, 15)
                .map_err(|_| AccountError::validation("phone_number", "Ensure this field has no more than 15 characters."))?;
            update_data.insert("phone_number".to_string(), json!(phone_number));
        }
        if let Some(dob) = request.dob {
            update_data.insert("dob".to_string(), json!(dob));
        }
        if let Some(gender) = request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(location) = request.location {
            update_data.insert("location".to_string(), json!(location));
        }
        if actor.is_admin {
            if let Some(is_active) = request.is_active {
                update_data.insert("is_active".to_string(), json!(is_active));
            }
            if let Some(is_admin) = request.is_admin {
                update_data.insert("is_admin".to_string(), json!(is_admin));
            }
        }

        update_data.insert("updated_by".to_string(), json!(actor.username));

        self.patch_user(user_id, update_data).await
    }

    /// Removes the account along with the patients, appointments and favorites it owns.
    /// Entities that lose a favorite get their `is_favorite` flag recomputed.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        debug!("Deleting user: {}", user_id);

        let removed: Vec<Value> = self.db.delete(USERS, &Query::new().eq("id", user_id)).await?;
        if removed.is_empty() {
            return Err(AccountError::UserNotFound);
        }

        let owned = Query::new().eq("user_id", user_id);
        let patients: Vec<Value> = self.db.delete("patients", &owned).await?;
        let patient_ids: Vec<&str> = patients.iter().filter_map(|p| p["id"].as_str()).collect();
        if !patient_ids.is_empty() {
            let appointments: Vec<Value> = self
                .db
                .delete("appointments", &Query::new().in_list("patient_id", &patient_ids))
                .await?;
            debug!("Removed {} appointments of user {}", appointments.len(), user_id);
        }

        let favorites: Vec<Favorite> = self.db.delete("favorites", &owned).await?;
        let touched: HashSet<_> = favorites.iter().map(|f| (f.entity_type, f.entity_id)).collect();
        for (entity_type, entity_id) in touched {
            self.favorites.sync_favorite_flag(entity_type, entity_id).await?;
        }

        info!(
            "User {} deleted with {} patients and {} favorites",
            user_id,
            patients.len(),
            favorites.len()
        );

        Ok(())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let (email, password) = match (request.email, request.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => (email, password),
            _ => return Err(AccountError::InvalidCredentials),
        };

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !user.is_active {
            debug!("Login refused for inactive user {}", user.id);
            return Err(AccountError::InvalidCredentials);
        }

        let matches = verify_password(&password, &user.password).unwrap_or_else(|e| {
            warn!("Stored password hash for {} is unreadable: {}", user.id, e);
            false
        });
        if !matches {
            return Err(AccountError::InvalidCredentials);
        }

        let identity = AuthUser {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: Some(user.email.clone()),
            is_admin: user.is_admin,
        };
        let token = issue_token(&identity, &self.config).map_err(AccountError::Token)?;

        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            user: LoginUser {
                user_id: user.id.to_string(),
                email: user.email,
                username: user.username,
            },
            token: BearerToken {
                token_type: "Bearer".to_string(),
                token,
            },
        })
    }

    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<User> {
        let candidate = required("otp", request.otp)?;
        let user = self.require_by_email(request.email).await?;

        if !otp_matches(user.otp.as_deref(), user.otp_expires_at, &candidate, Utc::now()) {
            return Err(AccountError::InvalidOtp);
        }

        let mut changes = serde_json::Map::new();
        changes.insert("is_email_verified".to_string(), json!(true));
        changes.insert("otp".to_string(), Value::Null);
        changes.insert("otp_expires_at".to_string(), Value::Null);

        let user = self.patch_user(user.id, changes).await?;
        info!("Email verified for user {}", user.id);
        Ok(user)
    }

    async fn issue_otp(&self, user: &User) -> Result<()> {
        let otp = generate_otp();

        let mut changes = serde_json::Map::new();
        changes.insert("otp".to_string(), json!(otp));
        changes.insert(
            "otp_expires_at".to_string(),
            json!(otp_expiry(Utc::now(), self.config.otp_ttl_minutes).to_rfc3339()),
        );
        self.patch_user(user.id, changes).await?;

        self.dispatch(EmailMessage::otp(&user.email, &otp)).await;
        Ok(())
    }

    pub async fn forgot_password(&self, email: Option<String>) -> Result<()> {
        let user = self.require_by_email(email).await?;
        debug!("Password reset requested for user {}", user.id);
        self.issue_otp(&user).await
    }

    pub async fn resend_otp(&self, email: Option<String>) -> Result<()> {
        let user = self.require_by_email(email).await?;
        if user.is_email_verified {
            return Err(AccountError::AlreadyVerified);
        }
        self.issue_otp(&user).await
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        let candidate = required("otp", request.otp)?;
        let new_password = required("new_password", request.new_password)?;
        validate_new_password("new_password", &new_password)?;

        let user = self.require_by_email(request.email).await?;

        if !otp_matches(user.otp.as_deref(), user.otp_expires_at, &candidate, Utc::now()) {
            return Err(AccountError::InvalidOtp);
        }

        let mut changes = serde_json::Map::new();
        changes.insert("password".to_string(), json!(hash_password(&new_password)?));
        changes.insert("otp".to_string(), Value::Null);
        changes.insert("otp_expires_at".to_string(), Value::Null);
        self.patch_user(user.id, changes).await?;

        info!("Password reset for user {}", user.id);
        Ok(())
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        let (current, new_password) = match (request.current_password, request.new_password) {
            (Some(current), Some(new_password)) if !current.is_empty() && !new_password.is_empty() => {
                (current, new_password)
            }
            _ => return Err(AccountError::MissingPasswords),
        };

        let user = self.get_user(user_id).await?;

        if !verify_password(&current, &user.password)? {
            return Err(AccountError::IncorrectPassword);
        }
        if verify_password(&new_password, &user.password)? {
            return Err(AccountError::PasswordReuse);
        }
        validate_new_password("new_password", &new_password)?;

        let mut changes = serde_json::Map::new();
        changes.insert("password".to_string(), json!(hash_password(&new_password)?));
        changes.insert("updated_by".to_string(), json!(user.username));
        self.patch_user(user.id, changes).await?;

        info!("Password changed for user {}", user.id);
        Ok(())
    }
}
