use chrono::Utc;
use sea_orm::*;

use crate::backup::snapshot::{SnapshotData, export_snapshot};

/// Tables included in a SQL dump, in insertion-safe order. Referential
/// integrity is suspended during import anyway, but a sorted dump keeps
/// diffs between backups readable.
const EXPORT_TABLES: &[&str] = &[
    "admin_users",
    "challenge_categories",
    "challenge_difficulties",
    "challenges",
    "players",
    "submissions",
    "announcements",
    "settings",
];

/// Render one JSON value as a PostgreSQL literal.
fn sql_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".into(),
        serde_json::Value::Bool(b) => if *b { "true" } else { "false" }.into(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

fn append_table(dump: &mut String, table: &str, rows: &[serde_json::Value]) {
    if rows.is_empty() {
        return;
    }

    dump.push_str(&format!("-- Table: {table}\n"));
    dump.push_str(&format!("TRUNCATE TABLE \"{table}\" CASCADE;\n"));

    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let columns: Vec<String> = obj.keys().map(|k| format!("\"{k}\"")).collect();
        let values: Vec<String> = obj.values().map(sql_literal).collect();
        dump.push_str(&format!(
            "INSERT INTO \"{table}\" ({}) VALUES ({});\n",
            columns.join(", "),
            values.join(", ")
        ));
    }

    dump.push('\n');
}

/// Render the full dataset as a textual SQL dump.
///
/// Unlike the JSON snapshot, the SQL form also carries the admin accounts:
/// it is a full-database dump, not a content backup. Referential-integrity
/// enforcement is disabled for the duration of the import so the statement
/// order never matters, mirroring what the matching import endpoint
/// expects.
pub fn render_sql_dump(data: &SnapshotData, admin_users: &[serde_json::Value]) -> String {
    let mut dump = String::new();
    dump.push_str("-- CTF Platform Database Export\n");
    dump.push_str(&format!("-- Export Date: {}\n\n", Utc::now().to_rfc3339()));
    dump.push_str("-- Disable foreign key checks during import\n");
    dump.push_str("SET session_replication_role = 'replica';\n\n");

    for &table in EXPORT_TABLES {
        let rows: &[serde_json::Value] = match table {
            "admin_users" => admin_users,
            "challenge_categories" => &data.categories,
            "challenge_difficulties" => &data.difficulties,
            "challenges" => &data.challenges,
            "players" => &data.players,
            "submissions" => &data.submissions,
            "announcements" => &data.announcements,
            "settings" => &data.settings,
            _ => &[],
        };
        append_table(&mut dump, table, rows);
    }

    dump.push_str("-- Re-enable foreign key checks\n");
    dump.push_str("SET session_replication_role = 'origin';\n");
    dump
}

/// Export the live database as a SQL dump.
pub async fn export_sql_dump(db: &DatabaseConnection) -> Result<String, DbErr> {
    let snapshot = export_snapshot(db).await?;
    let admins: Vec<serde_json::Value> = crate::entity::admin_user::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|m| {
            serde_json::to_value(&m)
                .map_err(|e| DbErr::Custom(format!("Entity serialization error: {e}")))
        })
        .collect::<Result<_, _>>()?;
    Ok(render_sql_dump(&snapshot.data, &admins))
}

/// Split uploaded SQL content into executable statements.
///
/// Comment lines and the `SET session_replication_role` wrapper are
/// dropped; everything else executes verbatim inside one transaction.
pub fn split_statements(sql: &str) -> Vec<String> {
    let without_comments: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("SET"))
        .map(String::from)
        .collect()
}
