use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entity::{category, challenge, difficulty, player, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AdminSession, PlayerSession};
use crate::extractors::json::AppJson;
use crate::models::challenge::{
    AdminChallengeResponse, ChallengeRequest, ChallengeResponse, SubmitFlagRequest,
    SubmitFlagResponse, validate_challenge_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

/// Find a challenge by ID or return 404.
async fn find_challenge<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<challenge::Model, AppError> {
    challenge::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Challenge not found".into()))
}

/// Check that the referenced category and difficulty exist.
async fn check_references<C: ConnectionTrait>(
    db: &C,
    payload: &ChallengeRequest,
) -> Result<(), AppError> {
    category::Entity::find_by_id(payload.category_id.as_str())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    difficulty::Entity::find_by_id(payload.difficulty_id.as_str())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Difficulty not found".into()))?;
    Ok(())
}

/// List all challenges, flags stripped.
#[utoipa::path(
    get,
    path = "/",
    tag = "Challenges",
    operation_id = "listChallenges",
    summary = "List challenges",
    responses(
        (status = 200, description = "All challenges, without flags", body = Vec<ChallengeResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_challenges(
    State(state): State<AppState>,
) -> Result<Json<Vec<ChallengeResponse>>, AppError> {
    let challenges = challenge::Entity::find().all(&state.db).await?;
    Ok(Json(
        challenges.into_iter().map(ChallengeResponse::from).collect(),
    ))
}

/// Get one challenge, flag stripped.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "getChallenge",
    summary = "Get a challenge",
    params(("id" = String, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge, without flag", body = ChallengeResponse),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(challenge_id = %id))]
pub async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let found = find_challenge(&state.db, &id).await?;
    Ok(Json(ChallengeResponse::from(found)))
}

/// Submit a flag for a challenge.
///
/// Scoring is idempotent: once a player has a correct submission for a
/// challenge, later submissions short-circuit to "already solved" without
/// recording anything or touching the score. The check and the insert run
/// in one transaction with the player row locked, so a rapid double-submit
/// cannot score twice.
#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Challenges",
    operation_id = "submitFlag",
    summary = "Submit a flag",
    params(("id" = String, Path, description = "Challenge ID")),
    request_body = SubmitFlagRequest,
    responses(
        (status = 200, description = "Submission outcome", body = SubmitFlagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not authenticated (LOGIN_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, player_session, payload), fields(challenge_id = %id, player_id = %player_session.player_id))]
pub async fn submit_flag(
    player_session: PlayerSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SubmitFlagRequest>,
) -> Result<Json<SubmitFlagResponse>, AppError> {
    if payload.flag.trim().is_empty() {
        return Err(AppError::Validation("Flag is required".into()));
    }

    let txn = state.db.begin().await?;

    let challenge_model = find_challenge(&txn, &id).await?;

    let player_model = player::Entity::find_by_id(player_session.player_id.as_str())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let already_solved = submission::Entity::find()
        .filter(submission::Column::PlayerId.eq(&player_model.id))
        .filter(submission::Column::ChallengeId.eq(&challenge_model.id))
        .filter(submission::Column::IsCorrect.eq(1))
        .one(&txn)
        .await?
        .is_some();

    if already_solved {
        txn.commit().await?;
        return Ok(Json(SubmitFlagResponse {
            correct: true,
            already_solved: true,
            message: "You've already solved this challenge".into(),
        }));
    }

    let is_correct = payload.flag.trim() == challenge_model.flag.trim();

    submission::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        player_id: Set(player_model.id.clone()),
        challenge_id: Set(challenge_model.id.clone()),
        submitted_flag: Set(payload.flag),
        is_correct: Set(i32::from(is_correct)),
        timestamp: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;

    if is_correct {
        let new_score = player_model.score + challenge_model.points;
        let mut active: player::ActiveModel = player_model.into();
        active.score = Set(new_score);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    if is_correct {
        info!(points = challenge_model.points, "Challenge solved");
    }

    Ok(Json(SubmitFlagResponse {
        correct: is_correct,
        already_solved: false,
        message: if is_correct {
            format!("Correct! You earned {} points", challenge_model.points)
        } else {
            "Incorrect flag. Try again!".into()
        },
    }))
}

/// Create a challenge.
#[utoipa::path(
    post,
    path = "/",
    tag = "Challenges",
    operation_id = "createChallenge",
    summary = "Create a challenge",
    request_body = ChallengeRequest,
    responses(
        (status = 201, description = "Challenge created", body = AdminChallengeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Category or difficulty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload))]
pub async fn create_challenge(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_challenge_request(&payload)?;
    check_references(&state.db, &payload).await?;

    let created = challenge::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        category_id: Set(payload.category_id),
        difficulty_id: Set(payload.difficulty_id),
        points: Set(payload.points),
        flag: Set(payload.flag),
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AdminChallengeResponse::from(created)),
    ))
}

/// Replace a challenge.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "updateChallenge",
    summary = "Update a challenge",
    params(("id" = String, Path, description = "Challenge ID")),
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge updated", body = AdminChallengeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Challenge, category, or difficulty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(challenge_id = %id))]
pub async fn update_challenge(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ChallengeRequest>,
) -> Result<Json<AdminChallengeResponse>, AppError> {
    validate_challenge_request(&payload)?;
    check_references(&state.db, &payload).await?;

    let existing = find_challenge(&state.db, &id).await?;

    let mut active: challenge::ActiveModel = existing.into();
    active.title = Set(payload.title.trim().to_string());
    active.description = Set(payload.description);
    active.category_id = Set(payload.category_id);
    active.difficulty_id = Set(payload.difficulty_id);
    active.points = Set(payload.points);
    active.flag = Set(payload.flag);
    let updated = active.update(&state.db).await?;

    Ok(Json(AdminChallengeResponse::from(updated)))
}

/// Delete a challenge.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Challenges",
    operation_id = "deleteChallenge",
    summary = "Delete a challenge",
    params(("id" = String, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin), fields(challenge_id = %id))]
pub async fn delete_challenge(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_challenge(&state.db, &id).await?;
    challenge::Entity::delete_by_id(existing.id.as_str())
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Challenge deleted successfully")))
}
