use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{admin_user, setting, submission};
use crate::error::AppError;

/// Request body for admin login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AdminLoginRequest {
    #[schema(example = "root")]
    pub username: String,
    pub password: String,
}

pub fn validate_admin_login_request(payload: &AdminLoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    }
    Ok(())
}

/// Safe admin projection.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminResponse {
    pub id: String,
    #[schema(example = "root")]
    pub username: String,
}

impl From<admin_user::Model> for AdminResponse {
    fn from(admin: admin_user::Model) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminAuthResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub admin: AdminResponse,
}

/// Current admin-session status, `authenticated: false` when anonymous.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminSessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminSessionInfo>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminSessionInfo {
    pub id: String,
    pub username: String,
}

/// Platform-wide statistics for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminStatsResponse {
    pub total_challenges: u64,
    pub total_players: u64,
    pub total_submissions: u64,
    pub successful_solves: u64,
    /// Challenge count per category name.
    pub challenges_by_category: HashMap<String, u64>,
    /// Challenge count per difficulty name.
    pub challenges_by_difficulty: HashMap<String, u64>,
    /// The ten most recent submissions, newest first.
    #[schema(value_type = Vec<Object>)]
    pub recent_submissions: Vec<submission::Model>,
}

/// One site setting.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SettingResponse {
    #[schema(example = "site_name")]
    pub key: String,
    #[schema(example = "CTF Platform")]
    pub value: String,
}

impl From<setting::Model> for SettingResponse {
    fn from(setting: setting::Model) -> Self {
        Self {
            key: setting.key,
            value: setting.value,
        }
    }
}

/// Request body for writing one site setting.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetSettingRequest {
    pub value: String,
}

pub fn validate_setting_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() || key.len() > 128 {
        return Err(AppError::Validation(
            "Setting key must be 1-128 characters".into(),
        ));
    }
    Ok(())
}
