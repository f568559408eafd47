use serde::{Deserialize, Serialize};

use crate::entity::player;
use crate::error::AppError;

/// Request body for player registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (3-50 characters).
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Unique email address.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (min 8 characters with upper-case, lower-case, and a digit).
    #[schema(example = "s3cure_Pass")]
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 3-50 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    // One '@' with a dotted domain part is enough here; deliverability is
    // the mail system's problem.
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !valid || email.len() > 254 {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Password must contain at least one number".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    validate_password_strength(&payload.password)?;
    Ok(())
}

/// Request body for player login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "s3cure_Pass")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Safe player projection: everything except the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PlayerResponse {
    pub id: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = 450)]
    pub score: i32,
}

impl From<player::Model> for PlayerResponse {
    fn from(player: player::Model) -> Self {
        Self {
            id: player.id,
            username: player.username,
            email: player.email,
            score: player.score,
        }
    }
}

/// Login/registration response: a message plus the safe projection.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub user: PlayerResponse,
}
