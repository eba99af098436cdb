use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "playlist")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub session_id: i32,
    pub provider_id: String,
    pub name: String,
    pub url: Option<String>,
    /// JSON array of track IDs in ranking order.
    #[sea_orm(column_type = "JsonBinary")]
    pub track_ids: serde_json::Value,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
