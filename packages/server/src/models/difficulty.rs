use serde::{Deserialize, Serialize};

use crate::entity::difficulty;
use crate::error::AppError;
use crate::models::shared::{validate_slug, validate_title};

/// Request body for creating or updating a difficulty tier.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DifficultyRequest {
    #[schema(example = "Easy")]
    pub name: String,
    #[schema(example = "easy")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(example = "#22c55e")]
    pub color: Option<String>,
    /// Relative ordering of tiers (1 = easiest).
    #[schema(example = 1)]
    pub level: i32,
    #[serde(default)]
    pub sort_order: i32,
}

pub fn validate_difficulty_request(payload: &DifficultyRequest) -> Result<(), AppError> {
    validate_title(&payload.name, "Name")?;
    validate_slug(&payload.slug)?;
    if payload.level < 1 {
        return Err(AppError::Validation("Level must be >= 1".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DifficultyResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub level: i32,
    pub sort_order: i32,
}

impl From<difficulty::Model> for DifficultyResponse {
    fn from(d: difficulty::Model) -> Self {
        Self {
            id: d.id,
            name: d.name,
            slug: d.slug,
            description: d.description,
            color: d.color,
            level: d.level,
            sort_order: d.sort_order,
        }
    }
}
