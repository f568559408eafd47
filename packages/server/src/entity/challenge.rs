use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,
    pub description: String, // in Markdown
    pub category_id: String,
    pub difficulty_id: String,
    pub points: i32,
    /// The secret. Stripped from every non-admin response.
    pub flag: String,
}

impl ActiveModelBehavior for ActiveModel {}
