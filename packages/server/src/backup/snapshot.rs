use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::entity::{
    announcement, category, challenge, difficulty, player, setting, submission,
};
use crate::error::AppError;

/// Envelope version written by this build. Imports accept any 1.x dump.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// A point-in-time export of every entity table.
///
/// Records are kept as raw JSON objects rather than typed models so that a
/// single malformed record in an uploaded backup surfaces as a per-record
/// diff error instead of failing the whole decode.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Snapshot {
    /// Envelope format version (e.g. "1.0.0").
    #[schema(example = "1.0.0")]
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SnapshotData {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub categories: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub difficulties: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub challenges: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub players: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub submissions: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub announcements: Vec<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub settings: Vec<serde_json::Value>,
}

impl Snapshot {
    /// Reject envelopes from an incompatible major version.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.version.is_empty() {
            return Err(AppError::Validation("Invalid backup format".into()));
        }
        if !self.version.starts_with("1.") {
            return Err(AppError::Validation(format!(
                "Unsupported backup version: {}",
                self.version
            )));
        }
        Ok(())
    }
}

async fn rows_as_json<E>(db: &DatabaseConnection) -> Result<Vec<serde_json::Value>, DbErr>
where
    E: EntityTrait,
    E::Model: Serialize,
{
    E::find()
        .all(db)
        .await?
        .into_iter()
        .map(|m| {
            serde_json::to_value(&m)
                .map_err(|e| DbErr::Custom(format!("Entity serialization error: {e}")))
        })
        .collect()
}

/// Export the full dataset as a versioned snapshot.
pub async fn export_snapshot(db: &DatabaseConnection) -> Result<Snapshot, DbErr> {
    Ok(Snapshot {
        version: SNAPSHOT_VERSION.to_owned(),
        export_date: Utc::now(),
        data: SnapshotData {
            categories: rows_as_json::<category::Entity>(db).await?,
            difficulties: rows_as_json::<difficulty::Entity>(db).await?,
            challenges: rows_as_json::<challenge::Entity>(db).await?,
            players: rows_as_json::<player::Entity>(db).await?,
            submissions: rows_as_json::<submission::Entity>(db).await?,
            announcements: rows_as_json::<announcement::Entity>(db).await?,
            settings: rows_as_json::<setting::Entity>(db).await?,
        },
    })
}
