use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, JwtClaims};

use crate::jwt::encode_claims;

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_url: String,
    pub database_api_key: String,
    pub media_root: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_url: "http://localhost:54321".to_string(),
            database_api_key: "test-api-key".to_string(),
            media_root: std::env::temp_dir()
                .join("careconnect-test-media")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl TestConfig {
    /// Points the database at a mock server.
    pub fn with_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_url: self.database_url.clone(),
            database_api_key: self.database_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            media_root: self.media_root.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("testuser", "test@example.com", false)
    }
}

impl TestUser {
    pub fn new(username: &str, email: &str, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            is_admin,
        }
    }

    pub fn patient(email: &str) -> Self {
        let username = email.split('@').next().unwrap_or("patient");
        Self::new(username, email, false)
    }

    pub fn admin(email: &str) -> Self {
        let username = email.split('@').next().unwrap_or("admin");
        Self::new(username, email, true)
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: Some(self.email.clone()),
            is_admin: self.is_admin,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: Some(user.email.clone()),
            is_admin: user.is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let config = AppConfig {
            jwt_secret: secret.to_string(),
            ..AppConfig::default()
        };

        encode_claims(&claims, &config).expect("test token signs")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Document shapes as the store returns them.
pub struct MockDatabaseResponses;

impl MockDatabaseResponses {
    pub fn user_document(user_id: &str, username: &str, email: &str, password_hash: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "username": username,
            "email": email,
            "password": password_hash,
            "phone_number": null,
            "dob": "1990-05-17",
            "gender": "female",
            "location": null,
            "is_active": true,
            "is_admin": false,
            "is_email_verified": false,
            "otp": "1234",
            "otp_expires_at": (Utc::now() + Duration::minutes(5)).to_rfc3339(),
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "updated_by": null
        })
    }

    pub fn patient_document(patient_id: &str, user_id: &str, booking_for: &str, name: &str) -> serde_json::Value {
        json!({
            "id": patient_id,
            "user_id": user_id,
            "booking_for": booking_for,
            "name": name,
            "gender": "female",
            "age": "34",
            "problem_description": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn category_document(category_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": category_id,
            "name": name,
            "description": null
        })
    }

    pub fn hospital_document(hospital_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": hospital_id,
            "name": name,
            "description": "General hospital",
            "category_ids": [],
            "location": {
                "address": "1 Main Street",
                "street": null,
                "neighborhood": null,
                "city": "Ahmedabad",
                "state": "Gujarat",
                "country": "India"
            },
            "phone_number": null,
            "email": null,
            "website": null,
            "image": null,
            "is_favorite": false,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_document(doctor_id: &str, name: &str, hospital_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "name": name,
            "category_id": null,
            "hospital_id": hospital_id,
            "qualification": "MBBS",
            "experience_years": 8,
            "about": null,
            "gender": null,
            "phone_number": null,
            "email": null,
            "location": null,
            "image": null,
            "is_favorite": false,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn working_time_document(entity_id: &str, entity_type: u8, day: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "entity_id": entity_id,
            "entity_type": entity_type,
            "day": day,
            "start_time": "09:00",
            "end_time": "17:00"
        })
    }

    pub fn package_document(package_id: &str, doctor_id: &str) -> serde_json::Value {
        json!({
            "id": package_id,
            "doctor_id": doctor_id,
            "duration_minutes": 15,
            "package": "video_call",
            "amount": 500,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_document(
        appointment_id: &str,
        patient_id: &str,
        package_id: &str,
        doctor_id: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "booking_id": "BK-20250101-ABC123",
            "patient_id": patient_id,
            "package_id": package_id,
            "doctor_id": doctor_id,
            "scheduled_at": (Utc::now() + Duration::days(2)).to_rfc3339(),
            "notes": null,
            "status": status,
            "cancellation_reason": null,
            "cancelled_at": null,
            "completed_at": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn review_document(review_id: &str, user_id: &str, entity_id: &str, entity_type: u8, rating: u8) -> serde_json::Value {
        json!({
            "id": review_id,
            "user_id": user_id,
            "entity_id": entity_id,
            "entity_type": entity_type,
            "rating": rating,
            "review": "Very attentive",
            "file": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn favorite_document(favorite_id: &str, user_id: &str, entity_id: &str, entity_type: u8) -> serde_json::Value {
        json!({
            "id": favorite_id,
            "user_id": user_id,
            "entity_id": entity_id,
            "entity_type": entity_type,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }
}
