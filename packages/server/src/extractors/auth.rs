use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::error::AppError;
use crate::extractors::session::SessionHandle;
use crate::state::AppState;

/// Authenticated admin, extracted from the admin slot of the session.
///
/// Add this as a handler parameter to require admin authentication. Only
/// the admin slot is consulted; a concurrently held player identity on the
/// same session neither helps nor hurts.
pub struct AdminSession {
    pub admin_id: String,
    pub username: String,
}

impl<S> FromRequestParts<S> for AdminSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionHandle::from_request_parts(parts, state).await?;

        let admin_id = session.data.admin_id.ok_or(AppError::AdminRequired)?;
        let username = session.data.admin_username.unwrap_or_default();

        Ok(AdminSession { admin_id, username })
    }
}

/// Authenticated player, extracted from the player slot of the session.
pub struct PlayerSession {
    pub player_id: String,
    pub username: String,
}

impl<S> FromRequestParts<S> for PlayerSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionHandle::from_request_parts(parts, state).await?;

        let player_id = session.data.player_id.ok_or(AppError::UserRequired)?;
        let username = session.data.player_username.unwrap_or_default();

        Ok(PlayerSession { player_id, username })
    }
}
