use chrono::{Duration, Utc};
use sea_orm::*;
use tracing::debug;
use uuid::Uuid;

use crate::entity::session;
use crate::session::SessionData;

/// Durable, database-backed session store.
///
/// Session ids are opaque random tokens; the row's jsonb `data` column
/// holds the identity slots. All writes complete before the methods
/// return, so a response is never sent ahead of the state it implies.
#[derive(Clone)]
pub struct SessionStore {
    db: DatabaseConnection,
    ttl: Duration,
}

/// A loaded session: row id plus decoded identity slots.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub id: String,
    pub data: SessionData,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Load a session by id. Expired rows are deleted on sight and report
    /// as absent. The TTL rolls from last access: the expiry is pushed out
    /// once less than half of it remains, so hot sessions stay alive
    /// without a write per request.
    pub async fn load(&self, id: &str) -> Result<Option<LoadedSession>, DbErr> {
        let Some(row) = session::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if row.expires_at <= now {
            session::Entity::delete_by_id(id).exec(&self.db).await?;
            return Ok(None);
        }

        if row.expires_at < now + (self.ttl / 2) {
            let mut active: session::ActiveModel = row.clone().into();
            active.expires_at = Set(now + self.ttl);
            active.update(&self.db).await?;
        }

        let data = serde_json::from_value(row.data.clone()).map_err(|e| {
            DbErr::Custom(format!("Corrupt session payload for {}: {e}", row.id))
        })?;

        Ok(Some(LoadedSession {
            id: row.id,
            data,
        }))
    }

    /// Issue a fresh session carrying `data`.
    pub async fn insert(&self, data: &SessionData) -> Result<LoadedSession, DbErr> {
        let id = Uuid::new_v4().to_string();
        let row = session::ActiveModel {
            id: Set(id.clone()),
            data: Set(serde_json::to_value(data)
                .map_err(|e| DbErr::Custom(format!("Session payload encode error: {e}")))?),
            expires_at: Set(Utc::now() + self.ttl),
        };
        row.insert(&self.db).await?;

        Ok(LoadedSession {
            id,
            data: data.clone(),
        })
    }

    /// Replace a session at the authentication boundary.
    ///
    /// The old row (if any) is destroyed and a new id is issued carrying
    /// `data`. A pre-established id never survives a login, so a fixated
    /// session cannot become privileged. The new row is durable before
    /// this returns; a crash in between leaves at most an anonymous gap,
    /// never a stale identity attached to the new id.
    pub async fn regenerate(
        &self,
        old_id: Option<&str>,
        data: &SessionData,
    ) -> Result<LoadedSession, DbErr> {
        if let Some(old_id) = old_id {
            session::Entity::delete_by_id(old_id).exec(&self.db).await?;
            debug!(session_id = old_id, "Session invalidated on regeneration");
        }
        self.insert(data).await
    }

    /// Persist updated identity slots for an existing session.
    pub async fn update(&self, id: &str, data: &SessionData) -> Result<(), DbErr> {
        let Some(row) = session::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(());
        };
        let mut active: session::ActiveModel = row.into();
        active.data = Set(serde_json::to_value(data)
            .map_err(|e| DbErr::Custom(format!("Session payload encode error: {e}")))?);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Destroy a session outright (universal logout).
    pub async fn destroy(&self, id: &str) -> Result<(), DbErr> {
        session::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Delete all expired rows. Run periodically from a background task.
    pub async fn purge_expired(&self) -> Result<u64, DbErr> {
        let res = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}
