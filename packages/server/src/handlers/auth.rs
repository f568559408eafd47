use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::player;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::PlayerSession;
use crate::extractors::json::AppJson;
use crate::extractors::session::{SessionHandle, removal_cookie, session_cookie};
use crate::models::auth::{
    AuthResponse, LoginRequest, PlayerResponse, RegisterRequest, validate_login_request,
    validate_register_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::hash;

/// Register a new player.
///
/// On success the session is regenerated with the player slot set and any
/// admin identity cleared; the fresh session id goes out as the cookie.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a player account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN, EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, payload), fields(username = %payload.username))]
pub async fn register(
    session: SessionHandle,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    let existing = player::Entity::find()
        .filter(player::Column::Username.eq(&username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let existing = player::Entity::find()
        .filter(player::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let new_player = player::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        score: Set(0),
        created_at: Set(Utc::now()),
    };

    let created = new_player.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::UsernameTaken
        }
        _ => AppError::from(e),
    })?;

    // Regenerate before writing the identity: a pre-login session id must
    // never become privileged.
    let mut data = session.data;
    data.login_player(&created.id, &created.username);
    let fresh = state
        .sessions
        .regenerate(session.id.as_deref(), &data)
        .await?;

    let jar = CookieJar::new().add(session_cookie(&state.config, fresh.id));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "Registration successful".into(),
            user: PlayerResponse::from(created),
        }),
    ))
}

/// Player login.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in as a player",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, payload), fields(username = %payload.username))]
pub async fn login(
    session: SessionHandle,
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    // Uniform failure: never reveal whether the username exists.
    let found = player::Entity::find()
        .filter(player::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &found.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let mut data = session.data;
    data.login_player(&found.id, &found.username);
    let fresh = state
        .sessions
        .regenerate(session.id.as_deref(), &data)
        .await?;

    let jar = CookieJar::new().add(session_cookie(&state.config, fresh.id));
    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".into(),
            user: PlayerResponse::from(found),
        }),
    ))
}

/// Player logout. Clears only the player slot; an admin identity held by
/// the same browser survives.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out the player identity",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    ),
)]
#[instrument(skip_all)]
pub async fn logout(
    session: SessionHandle,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut jar = CookieJar::new();

    if let Some(id) = session.id {
        let mut data = session.data;
        data.logout_player();
        if data.is_empty() {
            state.sessions.destroy(&id).await?;
            jar = jar.add(removal_cookie(&state.config));
        } else {
            state.sessions.update(&id, &data).await?;
        }
    }

    Ok((jar, Json(MessageResponse::new("Logout successful"))))
}

/// Current player profile.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Get the current player",
    responses(
        (status = 200, description = "Current player", body = PlayerResponse),
        (status = 401, description = "Not authenticated (LOGIN_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, player_session), fields(player_id = %player_session.player_id))]
pub async fn me(
    player_session: PlayerSession,
    State(state): State<AppState>,
) -> Result<Json<PlayerResponse>, AppError> {
    let found = player::Entity::find_by_id(player_session.player_id.as_str())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(PlayerResponse::from(found)))
}
