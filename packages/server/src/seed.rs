use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::vote;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Per-user vote quota check:
    // SELECT * FROM vote WHERE session_id = ? AND user_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_vote_session_user")
        .table(vote::Entity)
        .col(vote::Column::SessionId)
        .col(vote::Column::UserId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_vote_session_user exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_vote_session_user: {}", e);
        }
    }

    Ok(())
}
