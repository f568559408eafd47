use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entity::{admin_user, announcement, challenge, player, setting, submission};
use crate::error::AppError;
use crate::session::SessionData;
use crate::utils::hash;

/// Explicit installed/not-installed state.
///
/// Computed once at startup from "does any admin account exist" and
/// flipped in-process exactly when the first admin is created, instead of
/// re-querying on every install-gated request. The transition is one-way
/// at runtime; a fresh process recomputes from the database.
pub struct InstallGate {
    installed: AtomicBool,
}

impl InstallGate {
    pub async fn detect(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let admins = admin_user::Entity::find().count(db).await?;
        Ok(Self {
            installed: AtomicBool::new(admins > 0),
        })
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    pub fn mark_installed(&self) {
        self.installed.store(true, Ordering::Release);
    }

    /// The install-flow guard: anyone may pass while the system is not yet
    /// installed; once an admin account exists, only an admin session may.
    pub fn require_admin_once_installed(&self, session: &SessionData) -> Result<(), AppError> {
        if self.is_installed() && session.admin_id.is_none() {
            return Err(AppError::AccessDenied(
                "System is installed. Admin authentication required.".into(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of system readiness reported by the install endpoints.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct SystemCheck {
    pub database_connected: bool,
    pub is_installed: bool,
    pub admin_count: u64,
    pub challenge_count: u64,
    pub player_count: u64,
    pub errors: Vec<String>,
}

pub async fn check_system(db: &DatabaseConnection) -> SystemCheck {
    let mut check = SystemCheck {
        database_connected: false,
        is_installed: false,
        admin_count: 0,
        challenge_count: 0,
        player_count: 0,
        errors: Vec::new(),
    };

    match admin_user::Entity::find().count(db).await {
        Ok(count) => {
            check.database_connected = true;
            check.admin_count = count;
            check.is_installed = count > 0;
        }
        Err(e) => {
            check.errors.push(format!("Database query error: {e}"));
            return check;
        }
    }

    if let Ok(count) = challenge::Entity::find().count(db).await {
        check.challenge_count = count;
    }
    if let Ok(count) = player::Entity::find().count(db).await {
        check.player_count = count;
    }

    check
}

pub struct InstallConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub site_name: Option<String>,
    pub site_description: Option<String>,
}

/// Create the first admin account and the initial site settings, seeding
/// demo content when the challenge table is empty.
#[instrument(skip(db, config), fields(admin_username = %config.admin_username))]
pub async fn perform_install(
    db: &DatabaseConnection,
    config: InstallConfig,
) -> Result<admin_user::Model, AppError> {
    let check = check_system(db).await;
    if check.is_installed {
        return Err(AppError::Conflict("System is already installed".into()));
    }
    if !check.database_connected {
        return Err(AppError::Internal(
            check.errors.join("; "),
        ));
    }

    let password_hash = hash::hash_password(&config.admin_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let admin = admin_user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(config.admin_username),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    set_setting(db, "site_name", config.site_name.as_deref().unwrap_or("CTF Platform")).await?;
    set_setting(
        db,
        "site_description",
        config
            .site_description
            .as_deref()
            .unwrap_or("Capture The Flag Platform"),
    )
    .await?;
    set_setting(db, "installed_at", &Utc::now().to_rfc3339()).await?;
    set_setting(db, "install_version", env!("CARGO_PKG_VERSION")).await?;

    if check.challenge_count == 0 {
        crate::seed::seed_demo_data(db).await?;
    }

    info!(admin_id = %admin.id, "Installation completed");
    Ok(admin)
}

/// Upsert one setting by its natural key.
pub async fn set_setting(db: &impl ConnectionTrait, key: &str, value: &str) -> Result<(), DbErr> {
    let model = setting::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value.to_owned()),
        updated_at: Set(Utc::now()),
    };

    setting::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(setting::Column::Key)
                .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Delete all competition content and reseed the demo set.
pub async fn reset_demo_data(db: &DatabaseConnection) -> Result<(), AppError> {
    challenge::Entity::delete_many().exec(db).await?;
    submission::Entity::delete_many().exec(db).await?;
    announcement::Entity::delete_many().exec(db).await?;

    crate::seed::seed_demo_data(db).await?;
    Ok(())
}
