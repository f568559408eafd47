use serde::{Deserialize, Serialize};

use crate::entity::challenge;
use crate::error::AppError;
use crate::models::shared::validate_title;

/// Request body for creating or replacing a challenge.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChallengeRequest {
    #[schema(example = "SQL Injection Basics")]
    pub title: String,
    /// Challenge description in Markdown.
    pub description: String,
    /// Id of an existing category.
    pub category_id: String,
    /// Id of an existing difficulty.
    pub difficulty_id: String,
    #[schema(example = 100)]
    pub points: i32,
    /// The expected flag. Compared trimmed on submission.
    #[schema(example = "flag{sql_1nj3ct10n}")]
    pub flag: String,
}

pub fn validate_challenge_request(payload: &ChallengeRequest) -> Result<(), AppError> {
    validate_title(&payload.title, "Title")?;
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    if payload.points <= 0 {
        return Err(AppError::Validation("Points must be positive".into()));
    }
    if payload.flag.trim().is_empty() {
        return Err(AppError::Validation("Flag must not be empty".into()));
    }
    Ok(())
}

/// Public challenge projection: everything except the flag.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ChallengeResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub difficulty_id: String,
    pub points: i32,
}

impl From<challenge::Model> for ChallengeResponse {
    fn from(c: challenge::Model) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category_id: c.category_id,
            difficulty_id: c.difficulty_id,
            points: c.points,
        }
    }
}

/// Admin challenge projection, flag included.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminChallengeResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub difficulty_id: String,
    pub points: i32,
    pub flag: String,
}

impl From<challenge::Model> for AdminChallengeResponse {
    fn from(c: challenge::Model) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category_id: c.category_id,
            difficulty_id: c.difficulty_id,
            points: c.points,
            flag: c.flag,
        }
    }
}

/// Request body for a flag submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitFlagRequest {
    #[schema(example = "flag{sql_1nj3ct10n}")]
    pub flag: String,
}

/// Outcome of a flag submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitFlagResponse {
    pub correct: bool,
    /// True when a correct submission already existed; no re-scoring
    /// happened and no new submission was recorded.
    pub already_solved: bool,
    #[schema(example = "Correct! You earned 100 points")]
    pub message: String,
}
