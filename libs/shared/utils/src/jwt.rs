use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, JwtClaims};

fn signing_algorithm(config: &AppConfig) -> Result<Algorithm, String> {
    let algorithm = Algorithm::from_str(&config.jwt_algorithm)
        .map_err(|_| format!("Unsupported JWT algorithm: {}", config.jwt_algorithm))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(format!("JWT algorithm {:?} requires a key pair, only HMAC secrets are supported", other)),
    }
}

/// Signs a token for `user` valid for the configured lifetime.
pub fn issue_token(user: &AuthUser, config: &AppConfig) -> Result<String, String> {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(config.jwt_expiration_seconds)).timestamp(),
    };

    encode_claims(&claims, config)
}

pub fn encode_claims(claims: &JwtClaims, config: &AppConfig) -> Result<String, String> {
    if config.jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let algorithm = signing_algorithm(config)?;
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign token: {}", e))
}

pub fn validate_token(token: &str, config: &AppConfig) -> Result<AuthUser, String> {
    if config.jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let algorithm = signing_algorithm(config)?;
    let validation = Validation::new(algorithm);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("Token rejected: {}", e);
        match e.kind() {
            ErrorKind::ExpiredSignature => "Token expired".to_string(),
            ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
            _ => "Invalid token".to_string(),
        }
    })?;

    let user = AuthUser::from(data.claims);
    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
