use std::collections::HashMap;

use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::setting;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::extractors::session::SessionHandle;
use crate::install::{self, InstallConfig, SystemCheck};
use crate::models::install::{
    HealthResponse, InstallCheckResponse, SetupRequest, SetupResponse, validate_setup_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

/// Lightweight installation check for the setup UI. Open to anyone while
/// the system is uninstalled; admin-only afterwards.
#[utoipa::path(
    get,
    path = "/check",
    tag = "Install",
    operation_id = "installCheck",
    summary = "Check whether setup is needed",
    responses(
        (status = 200, description = "Installation status", body = InstallCheckResponse),
        (status = 403, description = "Installed and not admin (ACCESS_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session))]
pub async fn check(
    session: SessionHandle,
    State(state): State<AppState>,
) -> Result<Json<InstallCheckResponse>, AppError> {
    state.install.require_admin_once_installed(&session.data)?;

    let check = install::check_system(&state.db).await;
    Ok(Json(InstallCheckResponse {
        needs_setup: !check.is_installed,
        database_connected: check.database_connected,
        errors: check.errors,
    }))
}

/// Full system readiness report. Same gate as `/check`.
#[utoipa::path(
    get,
    path = "/system-check",
    tag = "Install",
    operation_id = "systemCheck",
    summary = "Full system readiness report",
    responses(
        (status = 200, description = "System check", body = SystemCheck),
        (status = 403, description = "Installed and not admin (ACCESS_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session))]
pub async fn system_check(
    session: SessionHandle,
    State(state): State<AppState>,
) -> Result<Json<SystemCheck>, AppError> {
    state.install.require_admin_once_installed(&session.data)?;
    Ok(Json(install::check_system(&state.db).await))
}

/// One-time installation: create the first admin account, write the
/// initial site settings, and seed demo content.
#[utoipa::path(
    post,
    path = "/setup",
    tag = "Install",
    operation_id = "installSetup",
    summary = "Install the platform",
    request_body = SetupRequest,
    responses(
        (status = 200, description = "Installation completed", body = SetupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Already installed (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(admin_username = %payload.admin_username))]
pub async fn setup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetupRequest>,
) -> Result<Json<SetupResponse>, AppError> {
    validate_setup_request(&payload)?;

    install::perform_install(
        &state.db,
        InstallConfig {
            admin_username: payload.admin_username.trim().to_string(),
            admin_password: payload.admin_password,
            site_name: payload.site_name,
            site_description: payload.site_description,
        },
    )
    .await?;

    state.install.mark_installed();

    Ok(Json(SetupResponse {
        success: true,
        message: "Installation completed successfully".into(),
    }))
}

/// Health report: readiness checks plus the current settings.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Install",
    operation_id = "installHealth",
    summary = "System health",
    responses(
        (status = 200, description = "Health report", body = HealthResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn health(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, AppError> {
    let check = install::check_system(&state.db).await;

    let settings: HashMap<String, String> = setting::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();

    Ok(Json(HealthResponse { check, settings }))
}

/// Seed the demo content set. Idempotent.
#[utoipa::path(
    post,
    path = "/seed-demo",
    tag = "Install",
    operation_id = "seedDemo",
    summary = "Seed demo data",
    responses(
        (status = 200, description = "Demo data seeded", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn seed_demo(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    crate::seed::seed_demo_data(&state.db).await?;
    Ok(Json(MessageResponse::new("Demo data seeded successfully")))
}

/// Wipe competition content and reseed the demo set.
#[utoipa::path(
    post,
    path = "/reset-demo",
    tag = "Install",
    operation_id = "resetDemo",
    summary = "Reset demo data",
    responses(
        (status = 200, description = "Demo data reset", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn reset_demo(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    install::reset_demo_data(&state.db).await?;
    Ok(Json(MessageResponse::new("Demo data reset successfully")))
}
