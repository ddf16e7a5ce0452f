use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;

use shared_models::error::AppError;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::field(
            field,
            format!("Ensure this field has no more than {} characters.", max),
        ));
    }
    Ok(())
}

/// Parses a 24h "HH:MM" clock time.
pub fn parse_clock_time(field: &str, value: &str) -> Result<NaiveTime, AppError> {
    if value.len() != 5 {
        return Err(AppError::field(field, "Time must be in HH:MM format."));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::field(field, "Time must be in HH:MM format."))
}
