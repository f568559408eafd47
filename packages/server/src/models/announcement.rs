use serde::{Deserialize, Serialize};

use crate::entity::announcement;
use crate::error::AppError;
use crate::models::shared::validate_title;

const ANNOUNCEMENT_TYPES: &[&str] = &["info", "warning", "success"];

/// Request body for creating or updating an announcement.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnnouncementRequest {
    #[schema(example = "Welcome to the competition!")]
    pub title: String,
    pub message: String,
    /// One of "info", "warning", "success".
    #[serde(rename = "type", default = "default_type")]
    #[schema(example = "info")]
    pub kind: String,
    /// 1 to show the announcement, 0 to hide it.
    #[serde(default = "default_active")]
    pub is_active: i32,
}

fn default_type() -> String {
    "info".into()
}

fn default_active() -> i32 {
    1
}

pub fn validate_announcement_request(payload: &AnnouncementRequest) -> Result<(), AppError> {
    validate_title(&payload.title, "Title")?;
    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".into()));
    }
    if !ANNOUNCEMENT_TYPES.contains(&payload.kind.as_str()) {
        return Err(AppError::Validation(
            "Type must be one of: info, warning, success".into(),
        ));
    }
    if !(payload.is_active == 0 || payload.is_active == 1) {
        return Err(AppError::Validation("is_active must be 0 or 1".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: i32,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(a: announcement::Model) -> Self {
        Self {
            id: a.id,
            title: a.title,
            message: a.message,
            kind: a.kind,
            is_active: a.is_active,
            created_by: a.created_by,
            created_at: a.created_at,
        }
    }
}
