use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_api_key: String,
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub jwt_expiration_seconds: i64,
    pub otp_ttl_minutes: i64,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub media_root: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_api_key: String::new(),
            jwt_secret: String::new(),
            jwt_algorithm: "HS256".to_string(),
            jwt_expiration_seconds: 28_800,
            otp_ttl_minutes: 5,
            email_api_url: String::new(),
            email_api_key: String::new(),
            email_from: "no-reply@careconnect.local".to_string(),
            media_root: "media".to_string(),
            port: 3000,
        }
    }
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            database_url: required("DATABASE_URL"),
            database_api_key: required("DATABASE_API_KEY"),
            jwt_secret: required("JWT_SECRET_KEY"),
            jwt_algorithm: env::var("JWT_ALGORITHM").unwrap_or(defaults.jwt_algorithm),
            jwt_expiration_seconds: parsed_or("JWT_EXPIRATION_DELTA", defaults.jwt_expiration_seconds),
            otp_ttl_minutes: parsed_or("OTP_TTL_MINUTES", defaults.otp_ttl_minutes),
            email_api_url: env::var("EMAIL_API_URL").unwrap_or_else(|_| {
                warn!("EMAIL_API_URL not set, outgoing mail will only be logged");
                String::new()
            }),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM").unwrap_or(defaults.email_from),
            media_root: env::var("MEDIA_ROOT").unwrap_or(defaults.media_root),
            port: parsed_or("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_url.is_empty()
            && !self.database_api_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_url.is_empty() && !self.email_api_key.is_empty()
    }
}
