use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One browser's session row. `data` holds the serialized identity slots
/// (see `session::SessionData`); the opaque id is what travels in the
/// cookie.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,

    pub expires_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
