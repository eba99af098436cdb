//! PostgreSQL-backed [`SessionStore`].
//!
//! Guarded inserts lock the session row with `SELECT ... FOR UPDATE`, re-read
//! the user's rows, run the guard and insert, all in one transaction. The
//! unique key on `submission` and the primary key on `vote` back this up at
//! the database level.

use async_trait::async_trait;
use common::QuotaViolation;
use common::store::{SessionStore, StoreError, SubmissionGuard, VoteGuard};
use common::tally::RankedResult;
use common::{NewPlaylist, NewSession, NewSubmission, Playlist, Session, Submission, Vote};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{playlist, session, submission, vote};

#[derive(Clone)]
pub struct SqlSessionStore {
    db: DatabaseConnection,
}

impl SqlSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl TryFrom<session::Model> for Session {
    type Error = StoreError;

    fn try_from(m: session::Model) -> Result<Self, Self::Error> {
        let results = m.results.map(decode_results).transpose()?;
        Ok(Session {
            id: m.id,
            name: m.name,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
            start_at: m.start_at,
            max_submissions: m.max_submissions,
            submission_phase_secs: m.submission_phase_secs,
            vote_phase_secs: m.vote_phase_secs,
            results,
        })
    }
}

impl From<submission::Model> for Submission {
    fn from(m: submission::Model) -> Self {
        Submission {
            id: m.id,
            session_id: m.session_id,
            user_id: m.user_id,
            track_id: m.track_id,
            created_at: m.created_at,
        }
    }
}

impl From<vote::Model> for Vote {
    fn from(m: vote::Model) -> Self {
        Vote {
            session_id: m.session_id,
            user_id: m.user_id,
            submission_id: m.submission_id,
            created_at: m.created_at,
        }
    }
}

impl TryFrom<playlist::Model> for Playlist {
    type Error = StoreError;

    fn try_from(m: playlist::Model) -> Result<Self, Self::Error> {
        let track_ids = serde_json::from_value(m.track_ids)
            .map_err(|e| StoreError::Backend(format!("corrupt playlist tracks: {e}")))?;
        Ok(Playlist {
            id: m.id,
            session_id: m.session_id,
            provider_id: m.provider_id,
            name: m.name,
            url: m.url,
            track_ids,
            created_at: m.created_at,
        })
    }
}

fn decode_results(value: serde_json::Value) -> Result<Vec<RankedResult>, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Backend(format!("corrupt results snapshot: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
}

/// Lock a session row for the rest of the transaction.
async fn lock_session(
    txn: &DatabaseTransaction,
    session_id: i32,
) -> Result<session::Model, StoreError> {
    session::Entity::find_by_id(session_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("session {session_id}")))
}

async fn user_submissions<C: ConnectionTrait>(
    db: &C,
    session_id: i32,
    user_id: i32,
) -> Result<Vec<Submission>, StoreError> {
    Ok(submission::Entity::find()
        .filter(submission::Column::SessionId.eq(session_id))
        .filter(submission::Column::UserId.eq(user_id))
        .order_by_asc(submission::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Submission::from)
        .collect())
}

async fn user_votes<C: ConnectionTrait>(
    db: &C,
    session_id: i32,
    user_id: i32,
) -> Result<Vec<Vote>, StoreError> {
    Ok(vote::Entity::find()
        .filter(vote::Column::SessionId.eq(session_id))
        .filter(vote::Column::UserId.eq(user_id))
        .order_by_asc(vote::Column::CreatedAt)
        .order_by_asc(vote::Column::SubmissionId)
        .all(db)
        .await?
        .into_iter()
        .map(Vote::from)
        .collect())
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    #[instrument(skip(self, new), fields(name = %new.name))]
    async fn create_session(&self, new: NewSession) -> Result<Session, StoreError> {
        let model = session::ActiveModel {
            name: Set(new.name),
            created_by: Set(new.created_by),
            start_at: Set(new.start_at),
            max_submissions: Set(new.max_submissions),
            submission_phase_secs: Set(new.submission_phase_secs),
            vote_phase_secs: Set(new.vote_phase_secs),
            results: Set(None),
            created_at: Set(new.created_at),
            updated_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        model.try_into()
    }

    async fn get_session(&self, id: i32) -> Result<Option<Session>, StoreError> {
        session::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    async fn list_sessions(&self, offset: u64, limit: u64) -> Result<Vec<Session>, StoreError> {
        session::Entity::find()
            .order_by_desc(session::Column::StartAt)
            .order_by_desc(session::Column::Id)
            .offset(Some(offset))
            .limit(Some(limit))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    async fn count_sessions(&self) -> Result<u64, StoreError> {
        Ok(session::Entity::find().count(&self.db).await?)
    }

    async fn update_session(&self, updated: &Session) -> Result<Session, StoreError> {
        let model = session::Entity::find_by_id(updated.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("session {}", updated.id)))?;

        let mut active: session::ActiveModel = model.into();
        active.name = Set(updated.name.clone());
        active.start_at = Set(updated.start_at);
        active.max_submissions = Set(updated.max_submissions);
        active.submission_phase_secs = Set(updated.submission_phase_secs);
        active.vote_phase_secs = Set(updated.vote_phase_secs);
        active.updated_at = Set(updated.updated_at);

        active.update(&self.db).await?.try_into()
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, id: i32) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        vote::Entity::delete_many()
            .filter(vote::Column::SessionId.eq(id))
            .exec(&txn)
            .await?;
        submission::Entity::delete_many()
            .filter(submission::Column::SessionId.eq(id))
            .exec(&txn)
            .await?;
        playlist::Entity::delete_many()
            .filter(playlist::Column::SessionId.eq(id))
            .exec(&txn)
            .await?;
        let result = session::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, new, guard), fields(session_id = new.session_id, user_id = new.user_id))]
    async fn add_submission(
        &self,
        new: NewSubmission,
        guard: SubmissionGuard<'_>,
    ) -> Result<Submission, StoreError> {
        let txn = self.db.begin().await?;

        lock_session(&txn, new.session_id).await?;
        let existing = user_submissions(&txn, new.session_id, new.user_id).await?;
        guard(&existing)?;

        let model = submission::ActiveModel {
            session_id: Set(new.session_id),
            user_id: Set(new.user_id),
            track_id: Set(new.track_id),
            created_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                StoreError::Rejected(QuotaViolation::DuplicateSubmission)
            }
            _ => StoreError::from(e),
        })?;

        txn.commit().await?;
        Ok(model.into())
    }

    async fn list_submissions(&self, session_id: i32) -> Result<Vec<Submission>, StoreError> {
        Ok(submission::Entity::find()
            .filter(submission::Column::SessionId.eq(session_id))
            .order_by_asc(submission::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Submission::from)
            .collect())
    }

    async fn list_user_submissions(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Submission>, StoreError> {
        user_submissions(&self.db, session_id, user_id).await
    }

    async fn get_submission(&self, id: i32) -> Result<Option<Submission>, StoreError> {
        Ok(submission::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Submission::from))
    }

    #[instrument(skip(self))]
    async fn delete_submission(&self, id: i32) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        vote::Entity::delete_many()
            .filter(vote::Column::SubmissionId.eq(id))
            .exec(&txn)
            .await?;
        let result = submission::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, new, guard), fields(session_id = new.session_id, user_id = new.user_id))]
    async fn add_vote(&self, new: Vote, guard: VoteGuard<'_>) -> Result<Vote, StoreError> {
        let txn = self.db.begin().await?;

        lock_session(&txn, new.session_id).await?;
        let belongs = submission::Entity::find_by_id(new.submission_id)
            .one(&txn)
            .await?
            .is_some_and(|s| s.session_id == new.session_id);
        if !belongs {
            return Err(StoreError::NotFound(format!(
                "submission {}",
                new.submission_id
            )));
        }

        let existing = user_votes(&txn, new.session_id, new.user_id).await?;
        if let Some(vote) = existing
            .iter()
            .find(|v| v.submission_id == new.submission_id)
        {
            return Ok(vote.clone());
        }
        guard(&existing)?;

        let model = vote::ActiveModel {
            user_id: Set(new.user_id),
            submission_id: Set(new.submission_id),
            session_id: Set(new.session_id),
            created_at: Set(new.created_at),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model.into())
    }

    async fn list_votes(&self, session_id: i32) -> Result<Vec<Vote>, StoreError> {
        Ok(vote::Entity::find()
            .filter(vote::Column::SessionId.eq(session_id))
            .order_by_asc(vote::Column::CreatedAt)
            .order_by_asc(vote::Column::UserId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Vote::from)
            .collect())
    }

    async fn list_user_votes(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Vote>, StoreError> {
        user_votes(&self.db, session_id, user_id).await
    }

    async fn delete_vote(&self, user_id: i32, submission_id: i32) -> Result<bool, StoreError> {
        let result = vote::Entity::delete_by_id((user_id, submission_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    #[instrument(skip(self, results))]
    async fn store_results_if_absent(
        &self,
        session_id: i32,
        results: Vec<RankedResult>,
    ) -> Result<Vec<RankedResult>, StoreError> {
        let txn = self.db.begin().await?;

        let model = lock_session(&txn, session_id).await?;
        if let Some(existing) = model.results.clone() {
            txn.rollback().await?;
            return decode_results(existing);
        }

        let mut active: session::ActiveModel = model.into();
        active.results = Set(Some(encode(&results)?));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(results)
    }

    #[instrument(skip(self, new), fields(session_id = new.session_id))]
    async fn add_playlist(&self, new: NewPlaylist) -> Result<Playlist, StoreError> {
        let model = playlist::ActiveModel {
            session_id: Set(new.session_id),
            provider_id: Set(new.provider_id),
            name: Set(new.name),
            url: Set(new.url),
            track_ids: Set(encode(&new.track_ids)?),
            created_at: Set(new.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        model.try_into()
    }

    async fn find_playlist(&self, session_id: i32) -> Result<Option<Playlist>, StoreError> {
        playlist::Entity::find()
            .filter(playlist::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await?
            .map(Playlist::try_from)
            .transpose()
    }

    async fn delete_playlist(&self, session_id: i32) -> Result<bool, StoreError> {
        let result = playlist::Entity::delete_many()
            .filter(playlist::Column::SessionId.eq(session_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
