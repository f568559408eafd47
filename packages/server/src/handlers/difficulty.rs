use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{challenge, difficulty};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::difficulty::{
    DifficultyRequest, DifficultyResponse, validate_difficulty_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

async fn find_difficulty<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<difficulty::Model, AppError> {
    difficulty::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Difficulty not found".into()))
}

async fn check_slug_free(
    db: &DatabaseConnection,
    slug: &str,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let existing = difficulty::Entity::find()
        .filter(difficulty::Column::Slug.eq(slug))
        .one(db)
        .await?;
    if let Some(existing) = existing
        && except_id != Some(existing.id.as_str())
    {
        return Err(AppError::Conflict(
            "Difficulty with this slug already exists".into(),
        ));
    }
    Ok(())
}

/// List difficulty tiers ordered for display.
#[utoipa::path(
    get,
    path = "/",
    tag = "Difficulties",
    operation_id = "listDifficulties",
    summary = "List difficulties",
    responses(
        (status = 200, description = "All difficulties", body = Vec<DifficultyResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_difficulties(
    State(state): State<AppState>,
) -> Result<Json<Vec<DifficultyResponse>>, AppError> {
    let difficulties = difficulty::Entity::find()
        .order_by_asc(difficulty::Column::SortOrder)
        .all(&state.db)
        .await?;
    Ok(Json(
        difficulties
            .into_iter()
            .map(DifficultyResponse::from)
            .collect(),
    ))
}

/// Get one difficulty.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Difficulties",
    operation_id = "getDifficulty",
    summary = "Get a difficulty",
    params(("id" = String, Path, description = "Difficulty ID")),
    responses(
        (status = 200, description = "Difficulty", body = DifficultyResponse),
        (status = 404, description = "Difficulty not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(difficulty_id = %id))]
pub async fn get_difficulty(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DifficultyResponse>, AppError> {
    let found = find_difficulty(&state.db, &id).await?;
    Ok(Json(DifficultyResponse::from(found)))
}

/// Create a difficulty tier.
#[utoipa::path(
    post,
    path = "/",
    tag = "Difficulties",
    operation_id = "createDifficulty",
    summary = "Create a difficulty",
    request_body = DifficultyRequest,
    responses(
        (status = 201, description = "Difficulty created", body = DifficultyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 409, description = "Slug already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(slug = %payload.slug))]
pub async fn create_difficulty(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DifficultyRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_difficulty_request(&payload)?;
    check_slug_free(&state.db, &payload.slug, None).await?;

    let created = difficulty::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        description: Set(payload.description),
        color: Set(payload.color),
        level: Set(payload.level),
        sort_order: Set(payload.sort_order),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(DifficultyResponse::from(created))))
}

/// Update a difficulty tier.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Difficulties",
    operation_id = "updateDifficulty",
    summary = "Update a difficulty",
    params(("id" = String, Path, description = "Difficulty ID")),
    request_body = DifficultyRequest,
    responses(
        (status = 200, description = "Difficulty updated", body = DifficultyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Difficulty not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(difficulty_id = %id))]
pub async fn update_difficulty(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<DifficultyRequest>,
) -> Result<Json<DifficultyResponse>, AppError> {
    validate_difficulty_request(&payload)?;
    check_slug_free(&state.db, &payload.slug, Some(&id)).await?;

    let existing = find_difficulty(&state.db, &id).await?;

    let mut active: difficulty::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(payload.slug);
    active.description = Set(payload.description);
    active.color = Set(payload.color);
    active.level = Set(payload.level);
    active.sort_order = Set(payload.sort_order);
    let updated = active.update(&state.db).await?;

    Ok(Json(DifficultyResponse::from(updated)))
}

/// Delete a difficulty tier. Refused while any challenge references it.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Difficulties",
    operation_id = "deleteDifficulty",
    summary = "Delete a difficulty",
    params(("id" = String, Path, description = "Difficulty ID")),
    responses(
        (status = 200, description = "Difficulty deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Difficulty not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Difficulty still referenced by challenges (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin), fields(difficulty_id = %id))]
pub async fn delete_difficulty(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_difficulty(&state.db, &id).await?;

    let referenced = challenge::Entity::find()
        .filter(challenge::Column::DifficultyId.eq(&existing.id))
        .count(&state.db)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Cannot delete difficulty with associated challenges. Please reassign or delete those challenges first.".into(),
        ));
    }

    difficulty::Entity::delete_by_id(existing.id.as_str())
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Difficulty deleted successfully")))
}
