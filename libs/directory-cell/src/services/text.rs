use shared_utils::validation::is_valid_email;

use crate::models::DirectoryError;

type Result<T> = std::result::Result<T, DirectoryError>;

fn too_long(field: &str, max: usize) -> DirectoryError {
    DirectoryError::validation(field, format!("Ensure this field has no more than {} characters.", max))
}

pub fn required_text(field: &str, value: Option<String>, max: usize) -> Result<String> {
    let value = match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(DirectoryError::validation(field, "This field is required.")),
    };
    if value.chars().count() > max {
        return Err(too_long(field, max));
    }
    Ok(value)
}

pub fn optional_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value {
        Some(v) if v.chars().count() > max => Err(too_long(field, max)),
        other => Ok(other),
    }
}

pub fn optional_email(value: Option<String>) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(email) if !is_valid_email(&email) => {
            Err(DirectoryError::validation("email", "Enter a valid email address."))
        }
        other => Ok(other),
    }
}
