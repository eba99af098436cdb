use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::StoreError;
use super::traits::{SessionStore, SubmissionGuard, VoteGuard};
use crate::records::{NewPlaylist, NewSession, NewSubmission, Playlist, Session, Submission, Vote};
use crate::tally::RankedResult;

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<i32, Session>,
    submissions: BTreeMap<i32, Submission>,
    votes: Vec<Vote>,
    /// Keyed by session ID.
    playlists: BTreeMap<i32, Playlist>,
    next_session_id: i32,
    next_submission_id: i32,
    next_playlist_id: i32,
}

impl Tables {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn user_submissions(&self, session_id: i32, user_id: i32) -> Vec<Submission> {
        self.submissions
            .values()
            .filter(|s| s.session_id == session_id && s.user_id == user_id)
            .cloned()
            .collect()
    }

    fn user_votes(&self, session_id: i32, user_id: i32) -> Vec<Vote> {
        self.votes
            .iter()
            .filter(|v| v.session_id == session_id && v.user_id == user_id)
            .cloned()
            .collect()
    }
}

/// Process-local store. One lock covers all tables, so every guarded write is
/// serialized against every other write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, new: NewSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = Tables::next_id(&mut tables.next_session_id);
        let session = Session {
            id,
            name: new.name,
            created_by: new.created_by,
            created_at: new.created_at,
            updated_at: new.created_at,
            start_at: new.start_at,
            max_submissions: new.max_submissions,
            submission_phase_secs: new.submission_phase_secs,
            vote_phase_secs: new.vote_phase_secs,
            results: None,
        };
        tables.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: i32) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.lock().await.sessions.get(&id).cloned())
    }

    async fn list_sessions(&self, offset: u64, limit: u64) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> =
            self.tables.lock().await.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.start_at.cmp(&a.start_at).then(b.id.cmp(&a.id)));
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(sessions.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_sessions(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.sessions.len() as u64)
    }

    async fn update_session(&self, session: &Session) -> Result<Session, StoreError> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session.id)))?;
        stored.name = session.name.clone();
        stored.start_at = session.start_at;
        stored.max_submissions = session.max_submissions;
        stored.submission_phase_secs = session.submission_phase_secs;
        stored.vote_phase_secs = session.vote_phase_secs;
        stored.updated_at = session.updated_at;
        Ok(stored.clone())
    }

    async fn delete_session(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.submissions.retain(|_, s| s.session_id != id);
        tables.votes.retain(|v| v.session_id != id);
        tables.playlists.remove(&id);
        debug!(session_id = id, "Session removed with its submissions and votes");
        Ok(true)
    }

    async fn add_submission(
        &self,
        new: NewSubmission,
        guard: SubmissionGuard<'_>,
    ) -> Result<Submission, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.sessions.contains_key(&new.session_id) {
            return Err(StoreError::NotFound(format!("session {}", new.session_id)));
        }
        guard(&tables.user_submissions(new.session_id, new.user_id))?;

        let id = Tables::next_id(&mut tables.next_submission_id);
        let submission = Submission {
            id,
            session_id: new.session_id,
            user_id: new.user_id,
            track_id: new.track_id,
            created_at: new.created_at,
        };
        tables.submissions.insert(id, submission.clone());
        Ok(submission)
    }

    async fn list_submissions(&self, session_id: i32) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .submissions
            .values()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_user_submissions(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Submission>, StoreError> {
        Ok(self.tables.lock().await.user_submissions(session_id, user_id))
    }

    async fn get_submission(&self, id: i32) -> Result<Option<Submission>, StoreError> {
        Ok(self.tables.lock().await.submissions.get(&id).cloned())
    }

    async fn delete_submission(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.submissions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.votes.retain(|v| v.submission_id != id);
        Ok(true)
    }

    async fn add_vote(&self, vote: Vote, guard: VoteGuard<'_>) -> Result<Vote, StoreError> {
        let mut tables = self.tables.lock().await;
        let belongs = tables
            .submissions
            .get(&vote.submission_id)
            .is_some_and(|s| s.session_id == vote.session_id);
        if !belongs {
            return Err(StoreError::NotFound(format!(
                "submission {}",
                vote.submission_id
            )));
        }
        if let Some(existing) = tables
            .votes
            .iter()
            .find(|v| v.user_id == vote.user_id && v.submission_id == vote.submission_id)
        {
            return Ok(existing.clone());
        }
        guard(&tables.user_votes(vote.session_id, vote.user_id))?;
        tables.votes.push(vote.clone());
        Ok(vote)
    }

    async fn list_votes(&self, session_id: i32) -> Result<Vec<Vote>, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .votes
            .iter()
            .filter(|v| v.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_user_votes(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Vote>, StoreError> {
        Ok(self.tables.lock().await.user_votes(session_id, user_id))
    }

    async fn delete_vote(&self, user_id: i32, submission_id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.votes.len();
        tables
            .votes
            .retain(|v| !(v.user_id == user_id && v.submission_id == submission_id));
        Ok(tables.votes.len() != before)
    }

    async fn store_results_if_absent(
        &self,
        session_id: i32,
        results: Vec<RankedResult>,
    ) -> Result<Vec<RankedResult>, StoreError> {
        let mut tables = self.tables.lock().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StoreError::NotFound(format!("session {session_id}")))?;
        if session.results.is_some() {
            debug!(session_id, "Result snapshot already present");
        }
        Ok(session.results.get_or_insert(results).clone())
    }

    async fn add_playlist(&self, new: NewPlaylist) -> Result<Playlist, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.playlists.contains_key(&new.session_id) {
            return Err(StoreError::Conflict(format!(
                "session {} already has a playlist",
                new.session_id
            )));
        }
        let id = Tables::next_id(&mut tables.next_playlist_id);
        let playlist = Playlist {
            id,
            session_id: new.session_id,
            provider_id: new.provider_id,
            name: new.name,
            url: new.url,
            track_ids: new.track_ids,
            created_at: new.created_at,
        };
        tables.playlists.insert(new.session_id, playlist.clone());
        Ok(playlist)
    }

    async fn find_playlist(&self, session_id: i32) -> Result<Option<Playlist>, StoreError> {
        Ok(self.tables.lock().await.playlists.get(&session_id).cloned())
    }

    async fn delete_playlist(&self, session_id: i32) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .playlists
            .remove(&session_id)
            .is_some())
    }
}
