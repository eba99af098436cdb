use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StoreError;
use crate::candidate::{Candidate, build_candidates, find_candidate};
use crate::quota::QuotaViolation;
use crate::records::{NewPlaylist, NewSession, NewSubmission, Playlist, Session, Submission, Vote};
use crate::tally::RankedResult;

/// Check run against the acting user's current submissions in the session,
/// inside the store's write critical section.
pub type SubmissionGuard<'a> =
    &'a (dyn Fn(&[Submission]) -> Result<(), QuotaViolation> + Send + Sync);

/// Check run against the acting user's current votes in the session, inside
/// the store's write critical section.
pub type VoteGuard<'a> = &'a (dyn Fn(&[Vote]) -> Result<(), QuotaViolation> + Send + Sync);

/// System of record for sessions, nominations, votes and playlists.
///
/// Guarded inserts serialize per session: the guard sees the rows as they are
/// at write time, and nothing else can insert for that session until the
/// write completes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError>;

    async fn get_session(&self, id: i32) -> Result<Option<Session>, StoreError>;

    /// One page of sessions, newest start first, ties by descending ID.
    async fn list_sessions(&self, offset: u64, limit: u64) -> Result<Vec<Session>, StoreError>;

    async fn count_sessions(&self) -> Result<u64, StoreError>;

    /// Persist the editable fields of `session`. The result snapshot is not
    /// touched; see [`SessionStore::store_results_if_absent`].
    async fn update_session(&self, session: &Session) -> Result<Session, StoreError>;

    /// Delete a session with its submissions, votes and playlist.
    ///
    /// Returns `true` if the session existed.
    async fn delete_session(&self, id: i32) -> Result<bool, StoreError>;

    /// Insert a submission if `guard` accepts the user's current submissions.
    async fn add_submission(
        &self,
        submission: NewSubmission,
        guard: SubmissionGuard<'_>,
    ) -> Result<Submission, StoreError>;

    /// All submissions of a session, oldest first.
    async fn list_submissions(&self, session_id: i32) -> Result<Vec<Submission>, StoreError>;

    async fn list_user_submissions(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Submission>, StoreError>;

    async fn get_submission(&self, id: i32) -> Result<Option<Submission>, StoreError>;

    /// Delete a submission and every vote cast for it.
    async fn delete_submission(&self, id: i32) -> Result<bool, StoreError>;

    /// Insert a vote if `guard` accepts the user's current votes.
    ///
    /// Voting twice for the same submission returns the existing vote without
    /// running the guard.
    async fn add_vote(&self, vote: Vote, guard: VoteGuard<'_>) -> Result<Vote, StoreError>;

    async fn list_votes(&self, session_id: i32) -> Result<Vec<Vote>, StoreError>;

    async fn list_user_votes(&self, session_id: i32, user_id: i32)
    -> Result<Vec<Vote>, StoreError>;

    /// Returns `true` if a vote was removed.
    async fn delete_vote(&self, user_id: i32, submission_id: i32) -> Result<bool, StoreError>;

    /// Every submission of the session paired with the user's vote on it.
    async fn user_candidates(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Candidate>, StoreError> {
        let submissions = self.list_submissions(session_id).await?;
        let votes = self.list_user_votes(session_id, user_id).await?;
        Ok(build_candidates(user_id, submissions, &votes))
    }

    /// One submission of the session paired with the user's vote on it.
    async fn candidate(
        &self,
        session_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<Option<Candidate>, StoreError> {
        let Some(submission) = self
            .get_submission(submission_id)
            .await?
            .filter(|s| s.session_id == session_id)
        else {
            return Ok(None);
        };
        let votes = self.list_user_votes(session_id, user_id).await?;
        Ok(Some(find_candidate(user_id, submission, &votes)))
    }

    /// Every vote of the session joined to the submission it endorses.
    async fn voted_submissions(
        &self,
        session_id: i32,
    ) -> Result<Vec<(Submission, Vote)>, StoreError> {
        let submissions: HashMap<i32, Submission> = self
            .list_submissions(session_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let votes = self.list_votes(session_id).await?;
        Ok(votes
            .into_iter()
            .filter_map(|vote| {
                submissions
                    .get(&vote.submission_id)
                    .map(|s| (s.clone(), vote))
            })
            .collect())
    }

    /// Persist `results` as the session's tally snapshot unless one exists.
    ///
    /// Returns the snapshot that is stored after the call, which is the
    /// earlier one if another caller got there first.
    async fn store_results_if_absent(
        &self,
        session_id: i32,
        results: Vec<RankedResult>,
    ) -> Result<Vec<RankedResult>, StoreError>;

    /// Fails with `Conflict` if the session already has a playlist.
    async fn add_playlist(&self, playlist: NewPlaylist) -> Result<Playlist, StoreError>;

    async fn find_playlist(&self, session_id: i32) -> Result<Option<Playlist>, StoreError>;

    async fn delete_playlist(&self, session_id: i32) -> Result<bool, StoreError>;
}
