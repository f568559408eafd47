use std::collections::{HashMap, HashSet};

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{player, setting, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::PlayerSession;
use crate::extractors::session::{SessionHandle, removal_cookie};
use crate::models::public::{LeaderboardEntry, SiteInfoResponse};
use crate::models::shared::MessageResponse;
use crate::state::AppState;

/// Public site metadata. Falls back to defaults when the settings are
/// absent (e.g. before installation).
#[utoipa::path(
    get,
    path = "/site-info",
    tag = "Public",
    operation_id = "siteInfo",
    summary = "Get site metadata",
    responses(
        (status = 200, description = "Site metadata", body = SiteInfoResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn site_info(State(state): State<AppState>) -> Json<SiteInfoResponse> {
    let mut site_name = "CTF Platform".to_string();
    let mut site_description = "Capture The Flag Platform".to_string();

    if let Ok(settings) = setting::Entity::find().all(&state.db).await {
        for s in settings {
            match s.key.as_str() {
                "site_name" => site_name = s.value,
                "site_description" => site_description = s.value,
                _ => {}
            }
        }
    }

    Json(SiteInfoResponse {
        site_name,
        site_description,
    })
}

/// Universal logout: destroys the whole session record, both identities.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Public",
    operation_id = "universalLogout",
    summary = "Destroy the session entirely",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    ),
)]
#[instrument(skip_all)]
pub async fn universal_logout(
    session: SessionHandle,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(id) = session.id {
        state.sessions.destroy(&id).await?;
    }

    let jar = CookieJar::new().add(removal_cookie(&state.config));
    Ok((jar, Json(MessageResponse::new("Logout successful"))))
}

/// Distinct challenge ids the current player has solved.
#[utoipa::path(
    get,
    path = "/solved",
    tag = "Public",
    operation_id = "solvedChallenges",
    summary = "List solved challenge ids",
    responses(
        (status = 200, description = "Solved challenge ids", body = Vec<String>),
        (status = 401, description = "Not authenticated (LOGIN_REQUIRED)", body = ErrorBody),
    ),
    security(("session" = [])),
)]
#[instrument(skip(state, player_session), fields(player_id = %player_session.player_id))]
pub async fn solved_challenges(
    player_session: PlayerSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let submissions = submission::Entity::find()
        .filter(submission::Column::PlayerId.eq(&player_session.player_id))
        .filter(submission::Column::IsCorrect.eq(1))
        .all(&state.db)
        .await?;

    let mut seen = HashSet::new();
    let mut solved = Vec::new();
    for sub in submissions {
        if seen.insert(sub.challenge_id.clone()) {
            solved.push(sub.challenge_id);
        }
    }

    Ok(Json(solved))
}

/// Leaderboard: players ranked by score descending, with distinct solve
/// counts.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "Public",
    operation_id = "leaderboard",
    summary = "Get the leaderboard",
    responses(
        (status = 200, description = "Ranked players", body = Vec<LeaderboardEntry>),
    ),
)]
#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let players = player::Entity::find().all(&state.db).await?;
    let correct = submission::Entity::find()
        .filter(submission::Column::IsCorrect.eq(1))
        .all(&state.db)
        .await?;

    let mut solved_by_player: HashMap<String, HashSet<String>> = HashMap::new();
    for sub in correct {
        solved_by_player
            .entry(sub.player_id)
            .or_default()
            .insert(sub.challenge_id);
    }

    let mut entries: Vec<LeaderboardEntry> = players
        .into_iter()
        .map(|p| {
            let solved_count = solved_by_player
                .get(&p.id)
                .map(|s| s.len() as u64)
                .unwrap_or(0);
            LeaderboardEntry {
                player_id: p.id,
                username: p.username,
                score: p.score,
                solved_count,
                rank: 0,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.username.cmp(&b.username)));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u64 + 1;
    }

    Ok(Json(entries))
}
