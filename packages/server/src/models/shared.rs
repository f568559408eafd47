use serde::Serialize;

use crate::error::AppError;

/// Generic `{message}` response for operations with no richer payload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logout successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validate a trimmed display name or title (1-256 Unicode characters).
pub fn validate_title(title: &str, what: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{what} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate a URL-safe slug (1-64 chars, lowercase alphanumeric and hyphens).
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 64 {
        return Err(AppError::Validation("Slug must be 1-64 characters".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::Validation(
            "Slug must contain only lowercase letters, digits, and hyphens".into(),
        ));
    }
    Ok(())
}
