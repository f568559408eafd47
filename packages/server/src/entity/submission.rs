use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub player_id: String,
    pub challenge_id: String,
    pub submitted_flag: String,
    /// 1 for a correct submission, 0 otherwise (boolean-as-integer in the
    /// relational contract).
    pub is_correct: i32,

    pub timestamp: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
