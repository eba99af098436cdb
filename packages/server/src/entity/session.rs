use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub created_by: i32,

    pub start_at: DateTimeUtc,
    pub max_submissions: i32,
    pub submission_phase_secs: i64,
    pub vote_phase_secs: i64,

    /// Tally snapshot as a JSON array of `{submission_id, score, place}`.
    /// NULL until the session is first read in the result phase.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub results: Option<serde_json::Value>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
