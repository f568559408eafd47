use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::auth::{validate_password_strength, validate_username};

/// Request body for the one-time installation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetupRequest {
    /// First admin account username (3-50 characters).
    #[schema(example = "root")]
    pub admin_username: String,
    /// First admin account password (min 8 characters with upper-case,
    /// lower-case, and a digit).
    pub admin_password: String,
    #[schema(example = "My CTF")]
    pub site_name: Option<String>,
    pub site_description: Option<String>,
}

pub fn validate_setup_request(payload: &SetupRequest) -> Result<(), AppError> {
    validate_username(&payload.admin_username)?;
    validate_password_strength(&payload.admin_password)?;
    Ok(())
}

/// Lightweight installation status for the setup UI.
#[derive(Serialize, utoipa::ToSchema)]
pub struct InstallCheckResponse {
    pub needs_setup: bool,
    pub database_connected: bool,
    pub errors: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SetupResponse {
    pub success: bool,
    #[schema(example = "Installation completed successfully")]
    pub message: String,
}

/// Full health report: readiness checks plus the current settings.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub check: crate::install::SystemCheck,
    pub settings: std::collections::HashMap<String, String>,
}
