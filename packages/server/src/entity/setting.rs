use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key/value site settings. The natural key is `key`: there is no
/// synthetic id, and every lookup, conflict check, and upsert targets it.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    pub value: String,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
