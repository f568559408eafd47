use std::collections::HashMap;

use axum::{Json, extract::Path, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{admin_user, category, challenge, difficulty, player, setting, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::extractors::session::{SessionHandle, removal_cookie, session_cookie};
use crate::install::set_setting;
use crate::models::admin::{
    AdminAuthResponse, AdminLoginRequest, AdminResponse, AdminSessionInfo, AdminSessionResponse,
    AdminStatsResponse, SetSettingRequest, SettingResponse, validate_admin_login_request,
    validate_setting_key,
};
use crate::models::challenge::AdminChallengeResponse;
use crate::models::shared::MessageResponse;
use crate::state::AppState;
use crate::utils::hash;

/// Admin login. Regenerates the session and clears any player identity in
/// the same write.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Admin",
    operation_id = "adminLogin",
    summary = "Log in as an administrator",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminAuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, payload), fields(username = %payload.username))]
pub async fn login(
    session: SessionHandle,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_admin_login_request(&payload)?;

    let username = payload.username.trim();

    let found = admin_user::Entity::find()
        .filter(admin_user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &found.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let mut data = session.data;
    data.login_admin(&found.id, &found.username);
    let fresh = state
        .sessions
        .regenerate(session.id.as_deref(), &data)
        .await?;

    let jar = CookieJar::new().add(session_cookie(&state.config, fresh.id));
    Ok((
        jar,
        Json(AdminAuthResponse {
            message: "Login successful".into(),
            admin: AdminResponse::from(found),
        }),
    ))
}

/// Admin logout. Clears only the admin slot; a player identity held by the
/// same browser survives.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Admin",
    operation_id = "adminLogout",
    summary = "Log out the admin identity",
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
        data.logout_admin();
        if data.is_empty() {
            state.sessions.destroy(&id).await?;
            jar = jar.add(removal_cookie(&state.config));
        } else {
            state.sessions.update(&id, &data).await?;
        }
    }

    Ok((jar, Json(MessageResponse::new("Logout successful"))))
}

/// Current admin-session status. Never fails; anonymous callers get
/// `authenticated: false`.
#[utoipa::path(
    get,
    path = "/session",
    tag = "Admin",
    operation_id = "adminSession",
    summary = "Check the admin session",
    responses(
        (status = 200, description = "Session status", body = AdminSessionResponse),
    ),
)]
pub async fn session_status(session: SessionHandle) -> Json<AdminSessionResponse> {
    match (session.data.admin_id, session.data.admin_username) {
        (Some(id), username) => Json(AdminSessionResponse {
            authenticated: true,
            admin: Some(AdminSessionInfo {
                id,
                username: username.unwrap_or_default(),
            }),
        }),
        _ => Json(AdminSessionResponse {
            authenticated: false,
            admin: None,
        }),
    }
}

/// List all challenges with flags included.
#[utoipa::path(
    get,
    path = "/challenges",
    tag = "Admin",
    operation_id = "adminListChallenges",
    summary = "List challenges (flags included)",
    responses(
        (status = 200, description = "All challenges", body = Vec<AdminChallengeResponse>),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_challenges(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminChallengeResponse>>, AppError> {
    let challenges = challenge::Entity::find().all(&state.db).await?;
    Ok(Json(
        challenges
            .into_iter()
            .map(AdminChallengeResponse::from)
            .collect(),
    ))
}

/// Get one challenge with its flag.
#[utoipa::path(
    get,
    path = "/challenges/{id}",
    tag = "Admin",
    operation_id = "adminGetChallenge",
    summary = "Get a challenge (flag included)",
    params(("id" = String, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge", body = AdminChallengeResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin), fields(challenge_id = %id))]
pub async fn get_challenge(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminChallengeResponse>, AppError> {
    let found = challenge::Entity::find_by_id(id.as_str())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".into()))?;
    Ok(Json(AdminChallengeResponse::from(found)))
}

/// Platform statistics for the admin dashboard.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "adminStats",
    summary = "Platform statistics",
    responses(
        (status = 200, description = "Statistics", body = AdminStatsResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn stats(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<AdminStatsResponse>, AppError> {
    let challenges = challenge::Entity::find().all(&state.db).await?;
    let total_players = player::Entity::find().count(&state.db).await?;
    let total_submissions = submission::Entity::find().count(&state.db).await?;
    let successful_solves = submission::Entity::find()
        .filter(submission::Column::IsCorrect.eq(1))
        .count(&state.db)
        .await?;

    let categories: HashMap<String, String> = category::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let difficulties: HashMap<String, String> = difficulty::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let mut challenges_by_category: HashMap<String, u64> = HashMap::new();
    let mut challenges_by_difficulty: HashMap<String, u64> = HashMap::new();
    for c in &challenges {
        let category_name = categories
            .get(&c.category_id)
            .cloned()
            .unwrap_or_else(|| c.category_id.clone());
        *challenges_by_category.entry(category_name).or_default() += 1;

        let difficulty_name = difficulties
            .get(&c.difficulty_id)
            .cloned()
            .unwrap_or_else(|| c.difficulty_id.clone());
        *challenges_by_difficulty.entry(difficulty_name).or_default() += 1;
    }

    let recent_submissions = submission::Entity::find()
        .order_by_desc(submission::Column::Timestamp)
        .limit(10)
        .all(&state.db)
        .await?;

    Ok(Json(AdminStatsResponse {
        total_challenges: challenges.len() as u64,
        total_players,
        total_submissions,
        successful_solves,
        challenges_by_category,
        challenges_by_difficulty,
        recent_submissions,
    }))
}

/// List all site settings.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "Admin",
    operation_id = "adminListSettings",
    summary = "List site settings",
    responses(
        (status = 200, description = "All settings", body = Vec<SettingResponse>),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_settings(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<SettingResponse>>, AppError> {
    let settings = setting::Entity::find().all(&state.db).await?;
    Ok(Json(
        settings.into_iter().map(SettingResponse::from).collect(),
    ))
}

/// Upsert one site setting by its natural key.
#[utoipa::path(
    put,
    path = "/settings/{key}",
    tag = "Admin",
    operation_id = "adminSetSetting",
    summary = "Write a site setting",
    params(("key" = String, Path, description = "Setting key")),
    request_body = SetSettingRequest,
    responses(
        (status = 200, description = "Setting written", body = SettingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(key = %key))]
pub async fn set_setting_value(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(key): Path<String>,
    AppJson(payload): AppJson<SetSettingRequest>,
) -> Result<Json<SettingResponse>, AppError> {
    validate_setting_key(&key)?;
    set_setting(&state.db, &key, &payload.value).await?;
    Ok(Json(SettingResponse {
        key,
        value: payload.value,
    }))
}
