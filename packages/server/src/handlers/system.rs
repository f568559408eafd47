use axum::{Json, extract::State, http::header, response::IntoResponse};
use sea_orm::*;
use tracing::{info, instrument};

use crate::backup::merge::{apply_snapshot, diff_snapshot};
use crate::backup::snapshot::{Snapshot, export_snapshot};
use crate::backup::sql::{export_sql_dump, split_statements};
use crate::entity::{announcement, category, challenge, difficulty, player, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::system::{
    ImportCheckRequest, ImportCheckResponse, ImportRequest, ImportResponse, SqlImportRequest,
    SqlImportResponse, SystemInfoResponse, TableCounts,
};
use crate::state::AppState;

/// System overview for the admin panel.
#[utoipa::path(
    get,
    path = "/info",
    tag = "System",
    operation_id = "systemInfo",
    summary = "System overview",
    responses(
        (status = 200, description = "System info", body = SystemInfoResponse),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn info(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<SystemInfoResponse>, AppError> {
    let db = &state.db;
    Ok(Json(SystemInfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database: TableCounts {
            challenges: challenge::Entity::find().count(db).await?,
            players: player::Entity::find().count(db).await?,
            categories: category::Entity::find().count(db).await?,
            difficulties: difficulty::Entity::find().count(db).await?,
            submissions: submission::Entity::find().count(db).await?,
            announcements: announcement::Entity::find().count(db).await?,
        },
    }))
}

/// Export the dataset as a versioned JSON snapshot.
#[utoipa::path(
    post,
    path = "/export/json",
    tag = "System",
    operation_id = "exportJson",
    summary = "Export the database as JSON",
    responses(
        (status = 200, description = "Snapshot", body = Snapshot),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn export_json(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = export_snapshot(&state.db).await?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"ctf-backup.json\"",
        )],
        Json(snapshot),
    ))
}

/// Export the full database (admin accounts included) as a SQL dump.
#[utoipa::path(
    post,
    path = "/export/sql",
    tag = "System",
    operation_id = "exportSql",
    summary = "Export the database as SQL",
    responses(
        (status = 200, description = "SQL dump", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn export_sql(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let dump = export_sql_dump(&state.db).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ctf-backup.sql\"",
            ),
        ],
        dump,
    ))
}

/// Diff an uploaded snapshot against the live database. Read-only: the
/// report tells the administrator which records conflict and which are
/// new, so every conflict can be resolved before anything is written.
#[utoipa::path(
    post,
    path = "/import/check",
    tag = "System",
    operation_id = "importCheck",
    summary = "Preview an import",
    request_body = ImportCheckRequest,
    responses(
        (status = 200, description = "Diff report", body = ImportCheckResponse),
        (status = 400, description = "Invalid backup (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload))]
pub async fn import_check(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImportCheckRequest>,
) -> Result<Json<ImportCheckResponse>, AppError> {
    let report = diff_snapshot(&state.db, &payload.data).await?;
    info!(
        conflicts = report.conflicts.len(),
        new_items = report.new_items.len(),
        errors = report.errors.len(),
        "Import preview computed"
    );

    let total_conflicts = report.conflicts.len();
    Ok(Json(ImportCheckResponse {
        report,
        total_conflicts,
    }))
}

/// Apply an uploaded snapshot under the given per-conflict resolutions.
/// All-or-nothing: one transaction spans every entity type, and any
/// record failure rolls the whole import back.
#[utoipa::path(
    post,
    path = "/import/json",
    tag = "System",
    operation_id = "importJson",
    summary = "Apply an import",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import result", body = ImportResponse),
        (status = 400, description = "Invalid backup or unresolved conflicts (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 500, description = "Apply failed, transaction rolled back (IMPORT_FAILED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload))]
pub async fn import_json(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let outcome = apply_snapshot(&state.db, &payload.data, &payload.resolutions).await?;
    Ok(Json(ImportResponse {
        message: "Import completed".into(),
        outcome,
    }))
}

/// Execute an uploaded SQL dump inside one transaction.
#[utoipa::path(
    post,
    path = "/import/sql",
    tag = "System",
    operation_id = "importSql",
    summary = "Import a SQL dump",
    request_body = SqlImportRequest,
    responses(
        (status = 200, description = "Import result", body = SqlImportResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (ADMIN_AUTH_REQUIRED)", body = ErrorBody),
        (status = 500, description = "Statement failed, transaction rolled back (IMPORT_FAILED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, _admin, payload))]
pub async fn import_sql(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SqlImportRequest>,
) -> Result<Json<SqlImportResponse>, AppError> {
    if payload.sql.trim().is_empty() {
        return Err(AppError::Validation("SQL content is required".into()));
    }

    let statements = split_statements(&payload.sql);
    let total = statements.len();
    let mut executed = 0usize;

    let txn = state.db.begin().await?;
    for statement in &statements {
        match txn
            .execute_raw(Statement::from_string(
                DbBackend::Postgres,
                statement.clone(),
            ))
            .await
        {
            Ok(_) => executed += 1,
            Err(e) => {
                txn.rollback().await?;
                return Err(AppError::Transaction(format!(
                    "Statement {} of {total} failed: {e}. The transaction was rolled back; no statements were applied.",
                    executed + 1
                )));
            }
        }
    }
    txn.commit().await?;

    info!(executed, total, "SQL import committed");
    Ok(Json(SqlImportResponse {
        message: "SQL import completed".into(),
        executed,
        total,
    }))
}
