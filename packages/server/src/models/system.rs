use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backup::merge::{DiffReport, ImportOutcome, Resolution};
use crate::backup::snapshot::Snapshot;

/// System overview for the admin panel.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SystemInfoResponse {
    #[schema(example = "ctf-platform")]
    pub name: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    pub database: TableCounts,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TableCounts {
    pub challenges: u64,
    pub players: u64,
    pub categories: u64,
    pub difficulties: u64,
    pub submissions: u64,
    pub announcements: u64,
}

/// Request body for the import preview (diff) endpoint.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportCheckRequest {
    pub data: Snapshot,
}

/// Diff report returned by the import preview.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportCheckResponse {
    #[serde(flatten)]
    pub report: DiffReport,
    /// Number of conflicts requiring a resolution before apply.
    pub total_conflicts: usize,
}

/// Request body for applying an import.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportRequest {
    pub data: Snapshot,
    /// Resolution per conflict, keyed `<type>-<key>` (e.g. `category-c1`,
    /// `setting-site_name`). Values: "skip", "update", or
    /// `{"edited": {...}}`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub resolutions: HashMap<String, Resolution>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportResponse {
    #[schema(example = "Import completed")]
    pub message: String,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

/// Request body for the raw SQL import.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SqlImportRequest {
    /// SQL dump as produced by the SQL export endpoint.
    pub sql: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SqlImportResponse {
    #[schema(example = "SQL import completed")]
    pub message: String,
    /// Statements executed.
    pub executed: usize,
    /// Statements parsed from the upload.
    pub total: usize,
}
