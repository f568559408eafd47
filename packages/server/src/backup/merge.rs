use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::backup::snapshot::{Snapshot, SnapshotData};
use crate::entity::{
    announcement, category, challenge, difficulty, player, setting, submission,
};
use crate::error::AppError;

/// Fields an administrator cannot change through an edited resolution.
/// Whatever the edit says, these are restored from the incoming record.
const IMMUTABLE_FIELDS: &[&str] = &["created_at", "updated_at", "password_hash"];

/// The entity types a backup snapshot can carry.
///
/// This enum is the merge engine's dispatch table: each kind knows its
/// natural key, how to name a record for humans, and how to insert or
/// upsert its records inside the apply transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Category,
    Difficulty,
    Challenge,
    Player,
    Submission,
    Announcement,
    Setting,
}

/// Apply order: referenced entities strictly before their referents.
/// Categories and difficulties precede challenges; players precede
/// submissions; announcements and settings are independent.
pub const APPLY_ORDER: [EntityKind; 7] = [
    EntityKind::Category,
    EntityKind::Difficulty,
    EntityKind::Challenge,
    EntityKind::Player,
    EntityKind::Submission,
    EntityKind::Announcement,
    EntityKind::Setting,
];

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Difficulty => "difficulty",
            EntityKind::Challenge => "challenge",
            EntityKind::Player => "player",
            EntityKind::Submission => "submission",
            EntityKind::Announcement => "announcement",
            EntityKind::Setting => "setting",
        }
    }

    /// Settings are keyed by their natural `key`; everything else by `id`.
    pub fn key_field(self) -> &'static str {
        match self {
            EntityKind::Setting => "key",
            _ => "id",
        }
    }

    pub fn records(self, data: &SnapshotData) -> &[serde_json::Value] {
        match self {
            EntityKind::Category => &data.categories,
            EntityKind::Difficulty => &data.difficulties,
            EntityKind::Challenge => &data.challenges,
            EntityKind::Player => &data.players,
            EntityKind::Submission => &data.submissions,
            EntityKind::Announcement => &data.announcements,
            EntityKind::Setting => &data.settings,
        }
    }

    pub fn key_of(self, record: &serde_json::Value) -> Option<String> {
        record
            .get(self.key_field())
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    /// A human-readable name for error messages and previews.
    pub fn label_of(self, record: &serde_json::Value) -> String {
        let field = match self {
            EntityKind::Category | EntityKind::Difficulty => "name",
            EntityKind::Challenge | EntityKind::Announcement => "title",
            EntityKind::Player => "username",
            EntityKind::Setting => "key",
            EntityKind::Submission => "id",
        };
        record
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| "<unknown>".into())
    }

    async fn fetch_live_keys(
        self,
        db: &DatabaseConnection,
    ) -> Result<HashMap<String, serde_json::Value>, DbErr> {
        match self {
            EntityKind::Category => live_keys::<category::Entity>(db, self).await,
            EntityKind::Difficulty => live_keys::<difficulty::Entity>(db, self).await,
            EntityKind::Challenge => live_keys::<challenge::Entity>(db, self).await,
            EntityKind::Player => live_keys::<player::Entity>(db, self).await,
            EntityKind::Submission => live_keys::<submission::Entity>(db, self).await,
            EntityKind::Announcement => live_keys::<announcement::Entity>(db, self).await,
            EntityKind::Setting => live_keys::<setting::Entity>(db, self).await,
        }
    }

    /// Insert a record, ignoring it when its key already exists. Returns
    /// whether a row was actually written.
    async fn apply_insert(
        self,
        txn: &DatabaseTransaction,
        record: &serde_json::Value,
    ) -> Result<bool, String> {
        match self {
            EntityKind::Category => {
                insert_or_ignore::<category::Entity, category::ActiveModel>(
                    txn,
                    self,
                    category::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Difficulty => {
                insert_or_ignore::<difficulty::Entity, difficulty::ActiveModel>(
                    txn,
                    self,
                    difficulty::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Challenge => {
                insert_or_ignore::<challenge::Entity, challenge::ActiveModel>(
                    txn,
                    self,
                    challenge::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Player => {
                insert_or_ignore::<player::Entity, player::ActiveModel>(
                    txn,
                    self,
                    player::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Submission => {
                insert_or_ignore::<submission::Entity, submission::ActiveModel>(
                    txn,
                    self,
                    submission::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Announcement => {
                insert_or_ignore::<announcement::Entity, announcement::ActiveModel>(
                    txn,
                    self,
                    announcement::Column::Id,
                    record,
                )
                .await
            }
            EntityKind::Setting => {
                insert_or_ignore::<setting::Entity, setting::ActiveModel>(
                    txn,
                    self,
                    setting::Column::Key,
                    record,
                )
                .await
            }
        }
    }

    /// Insert-or-update a record on its key. The updated column set
    /// deliberately excludes creation timestamps so an update cannot
    /// rewrite history.
    async fn apply_upsert(
        self,
        txn: &DatabaseTransaction,
        record: &serde_json::Value,
    ) -> Result<(), String> {
        match self {
            EntityKind::Category => {
                upsert::<category::Entity, category::ActiveModel>(
                    txn,
                    self,
                    category::Column::Id,
                    vec![
                        category::Column::Name,
                        category::Column::Slug,
                        category::Column::Description,
                        category::Column::Color,
                        category::Column::Icon,
                        category::Column::SortOrder,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Difficulty => {
                upsert::<difficulty::Entity, difficulty::ActiveModel>(
                    txn,
                    self,
                    difficulty::Column::Id,
                    vec![
                        difficulty::Column::Name,
                        difficulty::Column::Slug,
                        difficulty::Column::Description,
                        difficulty::Column::Color,
                        difficulty::Column::Level,
                        difficulty::Column::SortOrder,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Challenge => {
                upsert::<challenge::Entity, challenge::ActiveModel>(
                    txn,
                    self,
                    challenge::Column::Id,
                    vec![
                        challenge::Column::Title,
                        challenge::Column::Description,
                        challenge::Column::CategoryId,
                        challenge::Column::DifficultyId,
                        challenge::Column::Points,
                        challenge::Column::Flag,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Player => {
                upsert::<player::Entity, player::ActiveModel>(
                    txn,
                    self,
                    player::Column::Id,
                    vec![
                        player::Column::Username,
                        player::Column::Email,
                        player::Column::Score,
                        player::Column::PasswordHash,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Submission => {
                upsert::<submission::Entity, submission::ActiveModel>(
                    txn,
                    self,
                    submission::Column::Id,
                    vec![
                        submission::Column::PlayerId,
                        submission::Column::ChallengeId,
                        submission::Column::SubmittedFlag,
                        submission::Column::IsCorrect,
                        submission::Column::Timestamp,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Announcement => {
                upsert::<announcement::Entity, announcement::ActiveModel>(
                    txn,
                    self,
                    announcement::Column::Id,
                    vec![
                        announcement::Column::Title,
                        announcement::Column::Message,
                        announcement::Column::Kind,
                        announcement::Column::IsActive,
                        announcement::Column::CreatedBy,
                        announcement::Column::CreatedAt,
                    ],
                    record,
                )
                .await
            }
            EntityKind::Setting => {
                upsert::<setting::Entity, setting::ActiveModel>(
                    txn,
                    self,
                    setting::Column::Key,
                    vec![setting::Column::Value, setting::Column::UpdatedAt],
                    record,
                )
                .await
            }
        }
    }
}

async fn live_keys<E>(
    db: &DatabaseConnection,
    kind: EntityKind,
) -> Result<HashMap<String, serde_json::Value>, DbErr>
where
    E: EntityTrait,
    E::Model: Serialize,
{
    let mut map = HashMap::new();
    for model in E::find().all(db).await? {
        let value = serde_json::to_value(&model)
            .map_err(|e| DbErr::Custom(format!("Entity serialization error: {e}")))?;
        if let Some(key) = kind.key_of(&value) {
            map.insert(key, value);
        }
    }
    Ok(map)
}

fn decode_record<M: DeserializeOwned>(
    kind: EntityKind,
    record: &serde_json::Value,
) -> Result<M, String> {
    serde_json::from_value(record.clone())
        .map_err(|e| format!("{} {}: {e}", kind.as_str(), kind.label_of(record)))
}

async fn insert_or_ignore<E, A>(
    txn: &DatabaseTransaction,
    kind: EntityKind,
    conflict_col: E::Column,
    record: &serde_json::Value,
) -> Result<bool, String>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Send,
    E::Model: DeserializeOwned + IntoActiveModel<A>,
{
    let model: E::Model = decode_record(kind, record)?;
    let result = E::insert(model.into_active_model())
        .on_conflict(OnConflict::column(conflict_col).do_nothing().to_owned())
        .exec_without_returning(txn)
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(format!("{} {}: {e}", kind.as_str(), kind.label_of(record))),
    }
}

async fn upsert<E, A>(
    txn: &DatabaseTransaction,
    kind: EntityKind,
    conflict_col: E::Column,
    update_cols: Vec<E::Column>,
    record: &serde_json::Value,
) -> Result<(), String>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Send,
    E::Model: DeserializeOwned + IntoActiveModel<A>,
{
    let model: E::Model = decode_record(kind, record)?;
    E::insert(model.into_active_model())
        .on_conflict(
            OnConflict::column(conflict_col)
                .update_columns(update_cols)
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(|e| format!("{} {}: {e}", kind.as_str(), kind.label_of(record)))?;
    Ok(())
}

/// A snapshot record whose key already exists live. Requires an explicit
/// resolution before the import may proceed.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Conflict {
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "category")]
    pub kind: EntityKind,
    /// The record's natural key ("id", or "key" for settings).
    pub key: String,
    #[schema(value_type = Object)]
    pub existing: serde_json::Value,
    #[schema(value_type = Object)]
    pub incoming: serde_json::Value,
}

impl Conflict {
    /// The resolution-map key for this conflict, `<type>-<key>`.
    pub fn resolution_key(&self) -> String {
        format!("{}-{}", self.kind.as_str(), self.key)
    }
}

/// A snapshot record with no live counterpart. Implicitly resolved to an
/// insert; no administrator decision required.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NewItem {
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "challenge")]
    pub kind: EntityKind,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Outcome of the diff phase.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct DiffReport {
    pub conflicts: Vec<Conflict>,
    pub new_items: Vec<NewItem>,
    /// Per-record classification failures. The diff never aborts on a
    /// malformed record; it reports it here and keeps going.
    pub errors: Vec<String>,
}

/// Classify snapshot records against live key maps. Pure; the async
/// wrapper below supplies the maps from the database.
fn diff_against(
    data: &SnapshotData,
    live: &HashMap<EntityKind, HashMap<String, serde_json::Value>>,
) -> DiffReport {
    let mut report = DiffReport::default();

    for kind in APPLY_ORDER {
        let live_map = live.get(&kind);
        for record in kind.records(data) {
            if !record.is_object() {
                report
                    .errors
                    .push(format!("{}: record is not an object", kind.as_str()));
                continue;
            }
            let Some(key) = kind.key_of(record) else {
                report.errors.push(format!(
                    "{} {}: missing \"{}\" field",
                    kind.as_str(),
                    kind.label_of(record),
                    kind.key_field()
                ));
                continue;
            };

            match live_map.and_then(|m| m.get(&key)) {
                Some(existing) => report.conflicts.push(Conflict {
                    kind,
                    key,
                    existing: existing.clone(),
                    incoming: record.clone(),
                }),
                None => report.new_items.push(NewItem {
                    kind,
                    data: record.clone(),
                }),
            }
        }
    }

    report
}

/// Phase 1: diff a decoded snapshot against the live database.
pub async fn diff_snapshot(
    db: &DatabaseConnection,
    snapshot: &Snapshot,
) -> Result<DiffReport, AppError> {
    snapshot.validate()?;

    let mut live = HashMap::new();
    for kind in APPLY_ORDER {
        live.insert(kind, kind.fetch_live_keys(db).await?);
    }

    Ok(diff_against(&snapshot.data, &live))
}

/// Phase 2: the administrator's decision for one conflict.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Action(ResolutionAction),
    Edited(EditedResolution),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionAction {
    /// Keep the existing record, discard the incoming one.
    Skip,
    /// Overwrite the existing record with the incoming one verbatim.
    Update,
    /// Marker the client sends for new items; a no-op for conflicts.
    Add,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EditedResolution {
    /// Administrator-edited variant of the incoming record.
    pub edited: serde_json::Value,
}

/// Overlay an administrator edit onto the incoming record, restoring the
/// immutable fields and the natural key from the incoming version.
fn sanitize_edited(
    kind: EntityKind,
    incoming: &serde_json::Value,
    edited: &serde_json::Value,
) -> serde_json::Value {
    let mut out = edited.clone();
    let (Some(out_map), Some(in_map)) = (out.as_object_mut(), incoming.as_object()) else {
        return incoming.clone();
    };

    let mut pinned: Vec<&str> = IMMUTABLE_FIELDS.to_vec();
    pinned.push(kind.key_field());

    for field in pinned {
        match in_map.get(field) {
            Some(v) => {
                out_map.insert(field.to_owned(), v.clone());
            }
            None => {
                out_map.remove(field);
            }
        }
    }

    out
}

/// Result of the apply phase.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImportOutcome {
    pub imported: u64,
    pub skipped: u64,
}

/// Refuse to apply while any conflict is unresolved.
fn ensure_all_resolved(
    conflicts: &[Conflict],
    resolutions: &HashMap<String, Resolution>,
) -> Result<(), AppError> {
    let resolved = conflicts
        .iter()
        .filter(|c| resolutions.contains_key(&c.resolution_key()))
        .count();
    if resolved < conflicts.len() {
        return Err(AppError::Validation(format!(
            "All conflicts must be resolved before import ({resolved}/{} resolved)",
            conflicts.len()
        )));
    }
    Ok(())
}

/// Phase 3: apply a snapshot under the given resolutions.
///
/// Everything runs inside one transaction in `APPLY_ORDER`. Any single
/// record failure rolls the whole transaction back; a partial import
/// could leave a challenge pointing at a category that never arrived,
/// which is strictly worse than no import.
#[instrument(skip_all, fields(resolutions = resolutions.len()))]
pub async fn apply_snapshot(
    db: &DatabaseConnection,
    snapshot: &Snapshot,
    resolutions: &HashMap<String, Resolution>,
) -> Result<ImportOutcome, AppError> {
    let report = diff_snapshot(db, snapshot).await?;
    ensure_all_resolved(&report.conflicts, resolutions)?;

    let txn = db.begin().await?;

    match apply_in_txn(&txn, &report, resolutions).await {
        Ok(outcome) => {
            txn.commit().await?;
            info!(
                imported = outcome.imported,
                skipped = outcome.skipped,
                "Import committed"
            );
            Ok(outcome)
        }
        Err(detail) => {
            txn.rollback().await?;
            Err(AppError::Transaction(format!(
                "Import failed at {detail}. The transaction was rolled back; no records were imported."
            )))
        }
    }
}

async fn apply_in_txn(
    txn: &DatabaseTransaction,
    report: &DiffReport,
    resolutions: &HashMap<String, Resolution>,
) -> Result<ImportOutcome, String> {
    let mut outcome = ImportOutcome {
        imported: 0,
        skipped: 0,
    };

    for kind in APPLY_ORDER {
        for conflict in report.conflicts.iter().filter(|c| c.kind == kind) {
            // ensure_all_resolved ran before the transaction opened
            let resolution = resolutions
                .get(&conflict.resolution_key())
                .ok_or_else(|| format!("{} {}: unresolved conflict", kind.as_str(), conflict.key))?;

            match resolution {
                Resolution::Action(ResolutionAction::Skip) => outcome.skipped += 1,
                Resolution::Action(ResolutionAction::Update | ResolutionAction::Add) => {
                    kind.apply_upsert(txn, &conflict.incoming).await?;
                    outcome.imported += 1;
                }
                Resolution::Edited(EditedResolution { edited }) => {
                    let record = sanitize_edited(kind, &conflict.incoming, edited);
                    kind.apply_upsert(txn, &record).await?;
                    outcome.imported += 1;
                }
            }
        }

        for item in report.new_items.iter().filter(|i| i.kind == kind) {
            // A new item's absence at diff time does not guarantee absence
            // now; the insert stays conflict-safe under concurrent writers.
            if kind.apply_insert(txn, &item.data).await? {
                outcome.imported += 1;
            } else {
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}
