use serde::{Deserialize, Serialize};

use crate::entity::category;
use crate::error::AppError;
use crate::models::shared::{validate_slug, validate_title};

/// Request body for creating or updating a category.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Web Exploitation")]
    pub name: String,
    #[schema(example = "web")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(example = "#3b82f6")]
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

pub fn validate_category_request(payload: &CategoryRequest) -> Result<(), AppError> {
    validate_title(&payload.name, "Name")?;
    validate_slug(&payload.slug)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            color: c.color,
            icon: c.icon,
            sort_order: c.sort_order,
        }
    }
}
