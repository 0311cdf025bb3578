use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed display name (1-128 Unicode characters).
pub fn validate_name(name: &str, field: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 128 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-128 characters"
        )));
    }
    Ok(())
}

/// Minimal shape check for an email address. Full RFC validation is the
/// mail provider's problem.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.chars().count() <= 254
        && email.split('@').count() == 2
        && email.split('@').all(|part| !part.is_empty())
        && !email.contains(char::is_whitespace);
    if !valid {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Validate an optional free-text description (at most 2000 characters).
pub fn validate_optional_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(desc) = description
        && desc.chars().count() > 2000
    {
        return Err(AppError::Validation(
            "Description must be at most 2000 characters".into(),
        ));
    }
    Ok(())
}
