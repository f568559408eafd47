use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::announcement::{
    AnnouncementRequest, AnnouncementResponse, validate_announcement_request,
};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

async fn find_announcement<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<announcement::Model, AppError> {
    announcement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
}

/// List all announcements, including inactive ones.
#[utoipa::path(
    get,
    path = "/",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List announcements",
    responses(
        (status = 200, description = "All announcements", body = Vec<AnnouncementResponse>),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_announcements(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnouncementResponse>>, AppError> {
    let announcements = announcement::Entity::find()
        .order_by_asc(announcement::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(
        announcements
            .into_iter()
            .map(AnnouncementResponse::from)
            .collect(),
    ))
}

/// List announcements currently shown to players.
#[utoipa::path(
    get,
    path = "/active",
    tag = "Announcements",
    operation_id = "listActiveAnnouncements",
    summary = "List active announcements",
    responses(
        (status = 200, description = "Active announcements", body = Vec<AnnouncementResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_active_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnouncementResponse>>, AppError> {
    let announcements = announcement::Entity::find()
        .filter(announcement::Column::IsActive.eq(1))
        .order_by_asc(announcement::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(
        announcements
            .into_iter()
            .map(AnnouncementResponse::from)
            .collect(),
    ))
}

/// Create an announcement.
#[utoipa::path(
    post,
    path = "/",
    tag = "Announcements",
    operation_id = "createAnnouncement",
    summary = "Create an announcement",
    request_body = AnnouncementRequest,
    responses(
        (status = 201, description = "Announcement created", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, admin, payload))]
pub async fn create_announcement(
    admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_announcement_request(&payload)?;

    let created = announcement::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(payload.title.trim().to_string()),
        message: Set(payload.message),
        kind: Set(payload.kind),
        is_active: Set(payload.is_active),
        created_by: Set(admin.username),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AnnouncementResponse::from(created)),
    ))
}

/// Update an announcement.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "updateAnnouncement",
    summary = "Update an announcement",
    params(("id" = String, Path, description = "Announcement ID")),
    request_body = AnnouncementRequest,
    responses(
        (status = 200, description = "Announcement updated", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(announcement_id = %id))]
pub async fn update_announcement(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<AnnouncementRequest>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    validate_announcement_request(&payload)?;

    let existing = find_announcement(&state.db, &id).await?;

    let mut active: announcement::ActiveModel = existing.into();
    active.title = Set(payload.title.trim().to_string());
    active.message = Set(payload.message);
    active.kind = Set(payload.kind);
    active.is_active = Set(payload.is_active);
    let updated = active.update(&state.db).await?;

    Ok(Json(AnnouncementResponse::from(updated)))
}

/// Delete an announcement.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "deleteAnnouncement",
    summary = "Delete an announcement",
    params(("id" = String, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin), fields(announcement_id = %id))]
pub async fn delete_announcement(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_announcement(&state.db, &id).await?;
    announcement::Entity::delete_by_id(existing.id.as_str())
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new(
        "Announcement deleted successfully",
    )))
}
