use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::catalog::{CatalogError, Track, TrackCatalog};
use common::clock::Clock;
use common::config::SessionDefaults;
use common::quota;
use common::store::SessionStore;
use common::tally::{RankedResult, compute_results};
use common::{Candidate, NewSession, NewSubmission, Phase, Session, Submission, Vote};
use tracing::{info, instrument, warn};

use super::error::SessionError;
use crate::models::session::{
    CreateSessionRequest, ResultEntry, SessionResponse, SessionView, UpdateSessionRequest,
    validate_create_session, validate_track_id, validate_update_session,
};
use crate::models::shared::Pagination;

/// Orchestrates sessions on top of a store, a catalog and a clock.
///
/// Every operation reads the session afresh and derives the phase from the
/// clock; nothing is cached between calls.
#[derive(Clone)]
pub struct SessionService {
    pub(super) store: Arc<dyn SessionStore>,
    pub(super) catalog: Arc<dyn TrackCatalog>,
    clock: Arc<dyn Clock>,
    defaults: SessionDefaults,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn TrackCatalog>,
        clock: Arc<dyn Clock>,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            defaults,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -- sessions -----------------------------------------------------------

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_session(
        &self,
        user_id: i32,
        req: CreateSessionRequest,
    ) -> Result<Session, SessionError> {
        validate_create_session(&req)?;

        let now = self.now();
        let session = self
            .store
            .create_session(NewSession {
                name: req.name.trim().to_string(),
                created_by: user_id,
                created_at: now,
                start_at: req.start_at.unwrap_or(now),
                max_submissions: req
                    .max_submissions
                    .unwrap_or(self.defaults.max_submissions),
                submission_phase_secs: req
                    .submission_phase_secs
                    .unwrap_or(self.defaults.submission_phase_secs),
                vote_phase_secs: req.vote_phase_secs.unwrap_or(self.defaults.vote_phase_secs),
            })
            .await?;

        info!(session_id = session.id, "Session created");
        Ok(session)
    }

    /// One page of sessions, newest start first.
    pub async fn list_sessions(
        &self,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<(Vec<Session>, Pagination), SessionError> {
        let total = self.store.count_sessions().await?;
        let pagination = Pagination::new(page, per_page, total);
        if pagination.is_past_end() {
            return Ok((Vec::new(), pagination));
        }

        let sessions = self
            .store
            .list_sessions(pagination.offset(), pagination.per_page)
            .await?;
        Ok((sessions, pagination))
    }

    pub async fn get_session(&self, id: i32) -> Result<Session, SessionError> {
        self.load_session(id).await
    }

    #[instrument(skip(self, req))]
    pub async fn update_session(
        &self,
        id: i32,
        user_id: i32,
        req: UpdateSessionRequest,
    ) -> Result<Session, SessionError> {
        validate_update_session(&req)?;

        let mut session = self.load_session(id).await?;
        require_owner(session.created_by, user_id)?;
        if req.touches_rules() && session.has_results() {
            warn!(session_id = id, "Rejected rule change on finalized session");
            return Err(SessionError::ResultsFinalized);
        }

        if let Some(name) = req.name {
            session.name = name.trim().to_string();
        }
        if let Some(start_at) = req.start_at {
            session.start_at = start_at;
        }
        if let Some(max) = req.max_submissions {
            session.max_submissions = max;
        }
        if let Some(secs) = req.submission_phase_secs {
            session.submission_phase_secs = secs;
        }
        if let Some(secs) = req.vote_phase_secs {
            session.vote_phase_secs = secs;
        }
        session.updated_at = self.now();

        let updated = self.store.update_session(&session).await?;
        info!(session_id = id, "Session updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_session(&self, id: i32, user_id: i32) -> Result<(), SessionError> {
        let session = self.load_session(id).await?;
        require_owner(session.created_by, user_id)?;

        if !self.store.delete_session(id).await? {
            return Err(SessionError::SessionNotFound);
        }
        info!(session_id = id, "Session deleted");
        Ok(())
    }

    // -- submissions --------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn add_submission(
        &self,
        session_id: i32,
        user_id: i32,
        track_id: &str,
    ) -> Result<Submission, SessionError> {
        let track_id = track_id.trim();
        validate_track_id(track_id)?;

        let session = self.load_session(session_id).await?;
        self.require_phase(&session, Phase::Submission)?;

        // Nominations carry the provider's canonical ID, never the caller's spelling.
        let track = match self.catalog.get_track(track_id).await {
            Ok(track) => track,
            Err(CatalogError::NotFound(_)) => {
                return Err(SessionError::TrackNotFound(track_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let guard =
            |existing: &[Submission]| quota::check_submission(&session, existing, &track.id);
        let submission = self
            .store
            .add_submission(
                NewSubmission {
                    session_id,
                    user_id,
                    track_id: track.id.clone(),
                    created_at: self.now(),
                },
                &guard,
            )
            .await
            .map_err(SessionError::from)
            .inspect_err(|e| {
                if let SessionError::Quota(violation) = e {
                    warn!(%violation, "Submission rejected");
                }
            })?;

        info!(submission_id = submission.id, "Submission accepted");
        Ok(submission)
    }

    #[instrument(skip(self))]
    pub async fn remove_submission(
        &self,
        session_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<(), SessionError> {
        let session = self.load_session(session_id).await?;
        self.require_phase(&session, Phase::Submission)?;

        let submission = self.load_submission(session_id, submission_id).await?;
        require_owner(submission.user_id, user_id)?;

        if !self.store.delete_submission(submission_id).await? {
            return Err(SessionError::SubmissionNotFound);
        }
        info!(submission_id, "Submission removed");
        Ok(())
    }

    pub async fn user_submissions(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Submission>, SessionError> {
        self.load_session(session_id).await?;
        Ok(self
            .store
            .list_user_submissions(session_id, user_id)
            .await?)
    }

    // -- votes & candidates -------------------------------------------------

    #[instrument(skip(self))]
    pub async fn vote_for_candidate(
        &self,
        session_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<Candidate, SessionError> {
        let session = self.load_session(session_id).await?;
        self.require_phase(&session, Phase::Vote)?;
        self.load_submission(session_id, submission_id).await?;

        let guard = |existing: &[Vote]| quota::check_vote(&session, existing);
        self.store
            .add_vote(
                Vote {
                    session_id,
                    user_id,
                    submission_id,
                    created_at: self.now(),
                },
                &guard,
            )
            .await
            .map_err(SessionError::from)
            .inspect_err(|e| {
                if let SessionError::Quota(violation) = e {
                    warn!(%violation, "Vote rejected");
                }
            })?;

        info!(submission_id, "Vote cast");
        self.get_candidate(session_id, user_id, submission_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_vote_for_candidate(
        &self,
        session_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<Candidate, SessionError> {
        let session = self.load_session(session_id).await?;
        self.require_phase(&session, Phase::Vote)?;
        self.load_submission(session_id, submission_id).await?;

        if self.store.delete_vote(user_id, submission_id).await? {
            info!(submission_id, "Vote removed");
        }
        self.get_candidate(session_id, user_id, submission_id).await
    }

    /// Every nomination in the session with `user_id`'s vote state.
    pub async fn user_candidates(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Vec<Candidate>, SessionError> {
        self.load_session(session_id).await?;
        let mut candidates = self.store.user_candidates(session_id, user_id).await?;

        let ids: Vec<String> = candidates
            .iter()
            .map(|c| c.submission.track_id.clone())
            .collect();
        let tracks = self.track_index(&ids).await?;
        for candidate in &mut candidates {
            candidate.track = tracks.get(&candidate.submission.track_id).cloned();
        }
        Ok(candidates)
    }

    pub async fn get_candidate(
        &self,
        session_id: i32,
        user_id: i32,
        submission_id: i32,
    ) -> Result<Candidate, SessionError> {
        let mut candidate = self
            .store
            .candidate(session_id, user_id, submission_id)
            .await?
            .ok_or(SessionError::SubmissionNotFound)?;

        let tracks = self
            .track_index(std::slice::from_ref(&candidate.submission.track_id))
            .await?;
        candidate.track = tracks.get(&candidate.submission.track_id).cloned();
        Ok(candidate)
    }

    // -- results ------------------------------------------------------------

    /// Ranked results of a session in the result phase.
    #[instrument(skip(self))]
    pub async fn results(&self, session_id: i32) -> Result<Vec<ResultEntry>, SessionError> {
        let session = self.load_session(session_id).await?;
        self.require_phase(&session, Phase::Result)?;
        let ranked = self.ranked_results(&session).await?;
        self.result_entries(session_id, &ranked).await
    }

    /// The tally snapshot, taking it on first use.
    pub(super) async fn ranked_results(
        &self,
        session: &Session,
    ) -> Result<Vec<RankedResult>, SessionError> {
        if let Some(ref results) = session.results {
            return Ok(results.clone());
        }

        let votes: Vec<Vote> = self
            .store
            .voted_submissions(session.id)
            .await?
            .into_iter()
            .map(|(_, vote)| vote)
            .collect();
        let computed = compute_results(&votes);
        let stored = self
            .store
            .store_results_if_absent(session.id, computed)
            .await?;

        info!(
            session_id = session.id,
            entries = stored.len(),
            "Results snapshotted"
        );
        Ok(stored)
    }

    async fn result_entries(
        &self,
        session_id: i32,
        ranked: &[RankedResult],
    ) -> Result<Vec<ResultEntry>, SessionError> {
        let submissions: HashMap<i32, Submission> = self
            .store
            .list_submissions(session_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let ids: Vec<String> = ranked
            .iter()
            .filter_map(|r| submissions.get(&r.submission_id))
            .map(|s| s.track_id.clone())
            .collect();
        let tracks = self.track_index(&ids).await?;

        Ok(ranked
            .iter()
            .filter_map(|r| {
                let submission = submissions.get(&r.submission_id)?.clone();
                Some(ResultEntry {
                    track: tracks.get(&submission.track_id).cloned(),
                    submission,
                    score: r.score,
                    place: r.place,
                })
            })
            .collect())
    }

    // -- aggregate view -----------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_session_view(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<SessionView, SessionError> {
        let session = self.load_session(session_id).await?;
        let now = self.now();
        let phase = session.phase_at(now);

        let user_submissions = self
            .store
            .list_user_submissions(session_id, user_id)
            .await?;
        let user_votes = self.store.list_user_votes(session_id, user_id).await?;
        let user_candidates = self.user_candidates(session_id, user_id).await?;

        let results = if phase == Phase::Result {
            let ranked = self.ranked_results(&session).await?;
            Some(self.result_entries(session_id, &ranked).await?)
        } else {
            None
        };

        Ok(SessionView {
            submissions_left: quota::submissions_left(&session, user_submissions.len()),
            votes_left: quota::votes_left(&session, user_votes.len()),
            session: SessionResponse::at(session, now),
            user_submissions,
            user_candidates,
            results,
        })
    }

    // -- catalog ------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SessionError::Validation("q must not be empty".into()));
        }
        Ok(self.catalog.search_tracks(query).await?)
    }

    // -- helpers ------------------------------------------------------------

    pub(super) async fn load_session(&self, id: i32) -> Result<Session, SessionError> {
        self.store
            .get_session(id)
            .await?
            .ok_or(SessionError::SessionNotFound)
    }

    async fn load_submission(
        &self,
        session_id: i32,
        submission_id: i32,
    ) -> Result<Submission, SessionError> {
        self.store
            .get_submission(submission_id)
            .await?
            .filter(|s| s.session_id == session_id)
            .ok_or(SessionError::SubmissionNotFound)
    }

    pub(super) fn require_phase(
        &self,
        session: &Session,
        expected: Phase,
    ) -> Result<(), SessionError> {
        let actual = session.phase_at(self.now());
        if actual != expected {
            warn!(session_id = session.id, %expected, %actual, "Wrong phase");
            return Err(SessionError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    /// Catalog metadata for `ids`, keyed by track id. Duplicates are looked up once.
    async fn track_index(&self, ids: &[String]) -> Result<HashMap<String, Track>, SessionError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let tracks = self.catalog.get_tracks(&unique).await?;
        Ok(tracks.into_iter().map(|t| (t.id.clone(), t)).collect())
    }
}

pub(super) fn require_owner(owner_id: i32, user_id: i32) -> Result<(), SessionError> {
    if owner_id != user_id {
        return Err(SessionError::Unauthorized);
    }
    Ok(())
}
