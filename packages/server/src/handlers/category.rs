use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{category, challenge};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::category::{CategoryRequest, CategoryResponse, validate_category_request};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

async fn find_category<C: ConnectionTrait>(db: &C, id: &str) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

/// Reject a slug already used by a different category.
async fn check_slug_free(
    db: &DatabaseConnection,
    slug: &str,
    except_id: Option<&str>,
) -> Result<(), AppError> {
    let existing = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?;
    if let Some(existing) = existing
        && except_id != Some(existing.id.as_str())
    {
        return Err(AppError::Conflict(
            "Category with this slug already exists".into(),
        ));
    }
    Ok(())
}

/// List categories ordered for display.
#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::SortOrder)
        .all(&state.db)
        .await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Get one category.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(category_id = %id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let found = find_category(&state.db, &id).await?;
    Ok(Json(CategoryResponse::from(found)))
}

/// Create a category.
#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 409, description = "Slug already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_category_request(&payload)?;
    check_slug_free(&state.db, &payload.slug, None).await?;

    let created = category::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        description: Set(payload.description),
        color: Set(payload.color),
        icon: Set(payload.icon),
        sort_order: Set(payload.sort_order),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

/// Update a category.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(category_id = %id))]
pub async fn update_category(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    validate_category_request(&payload)?;
    check_slug_free(&state.db, &payload.slug, Some(&id)).await?;

    let existing = find_category(&state.db, &id).await?;

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(payload.slug);
    active.description = Set(payload.description);
    active.color = Set(payload.color);
    active.icon = Set(payload.icon);
    active.sort_order = Set(payload.sort_order);
    let updated = active.update(&state.db).await?;

    Ok(Json(CategoryResponse::from(updated)))
}

/// Delete a category.
///
/// Refused while any challenge references it; the application enforces
/// this guard itself rather than relying on the database.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Category still referenced by challenges (CONFLICT)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin), fields(category_id = %id))]
pub async fn delete_category(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_category(&state.db, &id).await?;

    let referenced = challenge::Entity::find()
        .filter(challenge::Column::CategoryId.eq(&existing.id))
        .count(&state.db)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Cannot delete category with associated challenges. Please reassign or delete those challenges first.".into(),
        ));
    }

    category::Entity::delete_by_id(existing.id.as_str())
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
