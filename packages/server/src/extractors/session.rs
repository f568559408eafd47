use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::session::SessionData;
use crate::state::AppState;

/// The current request's session, loaded from the session cookie.
///
/// Always succeeds: an absent or expired cookie yields an anonymous handle
/// (`id: None`, empty slots). Handlers that mutate the session use `id`
/// to update, regenerate, or destroy the backing row.
pub struct SessionHandle {
    /// Backing row id, when a live session row was found.
    pub id: Option<String>,
    pub data: SessionData,
}

impl SessionHandle {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            data: SessionData::default(),
        }
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(cookie) = jar.get(&app.config.session.cookie_name) else {
            return Ok(Self::anonymous());
        };

        match app.sessions.load(cookie.value()).await {
            Ok(Some(loaded)) => Ok(Self {
                id: Some(loaded.id),
                data: loaded.data,
            }),
            Ok(None) => Ok(Self::anonymous()),
            Err(e) => Err(AppError::Internal(format!("Session load error: {e}"))),
        }
    }
}

/// Build the session cookie for a freshly issued session id.
pub fn session_cookie(config: &AppConfig, session_id: String) -> Cookie<'static> {
    Cookie::build((config.session.cookie_name.clone(), session_id))
        .http_only(true)
        .secure(config.session.cookie_secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(config.session.ttl_seconds))
        .build()
}

/// Build an expired cookie that removes the session cookie client-side.
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((config.session.cookie_name.clone(), ""))
        .http_only(true)
        .secure(config.session.cookie_secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
