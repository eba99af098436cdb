use chrono::{DateTime, Utc};
use common::catalog::Track;
use common::{Candidate, Phase, Session, Submission};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_name};
use crate::session::SessionError;

/// Upper bound on `max_submissions`.
pub const MAX_SUBMISSIONS_LIMIT: i32 = 100;
/// Upper bound on either phase length: one year.
pub const MAX_PHASE_SECS: i64 = 366 * 24 * 60 * 60;
/// Provider track IDs are short base62 strings.
pub const MAX_TRACK_ID_LEN: usize = 64;

/// Request body for creating a session. Omitted fields use the server defaults.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateSessionRequest {
    #[schema(example = "Summer bangers")]
    pub name: String,
    /// Defaults to now.
    pub start_at: Option<DateTime<Utc>>,
    #[schema(example = 5)]
    pub max_submissions: Option<i32>,
    #[schema(example = 432000)]
    pub submission_phase_secs: Option<i64>,
    #[schema(example = 432000)]
    pub vote_phase_secs: Option<i64>,
}

/// PATCH body for a session. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSessionRequest {
    pub name: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub max_submissions: Option<i32>,
    pub submission_phase_secs: Option<i64>,
    pub vote_phase_secs: Option<i64>,
}

impl UpdateSessionRequest {
    /// True if the request changes the schedule or the quota.
    pub fn touches_rules(&self) -> bool {
        self.start_at.is_some()
            || self.max_submissions.is_some()
            || self.submission_phase_secs.is_some()
            || self.vote_phase_secs.is_some()
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddSubmissionRequest {
    /// Catalog track identifier.
    #[schema(example = "4uLU6hMCjMI75M1A2tKUQC")]
    pub track_id: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SessionListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct TrackSearchQuery {
    /// Free-text search.
    #[param(example = "daft punk")]
    pub q: String,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// A session together with its current phase.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    pub phase: Phase,
    /// Seconds until the current phase ends; 0 once results are out.
    #[schema(example = 86400)]
    pub remaining_secs: i64,
    pub submission_ends_at: DateTime<Utc>,
    pub vote_ends_at: DateTime<Utc>,
    #[schema(example = 2)]
    pub max_votes: i32,
}

impl SessionResponse {
    pub fn at(session: Session, now: DateTime<Utc>) -> Self {
        let schedule = session.schedule();
        Self {
            phase: schedule.phase_at(now),
            remaining_secs: schedule.remaining(now).num_seconds(),
            submission_ends_at: schedule.submission_ends_at(),
            vote_ends_at: schedule.vote_ends_at(),
            max_votes: session.max_votes(),
            session,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionListResponse {
    pub data: Vec<SessionResponse>,
    pub pagination: Pagination,
}

/// One ranked line of a session's results.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ResultEntry {
    pub submission: Submission,
    pub track: Option<Track>,
    #[schema(example = 3)]
    pub score: u32,
    #[schema(example = 1)]
    pub place: i32,
}

/// Everything one viewer needs to render a session.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: SessionResponse,
    #[schema(example = 3)]
    pub submissions_left: i32,
    #[schema(example = 1)]
    pub votes_left: i32,
    /// The viewer's own nominations.
    pub user_submissions: Vec<Submission>,
    /// Every nomination with the viewer's vote state.
    pub user_candidates: Vec<Candidate>,
    /// Present once the session is in the result phase.
    pub results: Option<Vec<ResultEntry>>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_max_submissions(value: i32) -> Result<(), SessionError> {
    if !(1..=MAX_SUBMISSIONS_LIMIT).contains(&value) {
        return Err(SessionError::Validation(format!(
            "max_submissions must be between 1 and {MAX_SUBMISSIONS_LIMIT}"
        )));
    }
    Ok(())
}

fn validate_phase_secs(field: &str, value: i64) -> Result<(), SessionError> {
    if !(1..=MAX_PHASE_SECS).contains(&value) {
        return Err(SessionError::Validation(format!(
            "{field} must be between 1 and {MAX_PHASE_SECS} seconds"
        )));
    }
    Ok(())
}

/// Accept only bare provider IDs, so nothing but the ID reaches the catalog
/// request or the stored row.
pub fn validate_track_id(track_id: &str) -> Result<(), SessionError> {
    if track_id.is_empty()
        || track_id.len() > MAX_TRACK_ID_LEN
        || !track_id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(SessionError::Validation(format!(
            "track_id must be 1-{MAX_TRACK_ID_LEN} ASCII letters or digits"
        )));
    }
    Ok(())
}

pub fn validate_create_session(req: &CreateSessionRequest) -> Result<(), SessionError> {
    validate_name(&req.name)?;
    if let Some(max) = req.max_submissions {
        validate_max_submissions(max)?;
    }
    if let Some(secs) = req.submission_phase_secs {
        validate_phase_secs("submission_phase_secs", secs)?;
    }
    if let Some(secs) = req.vote_phase_secs {
        validate_phase_secs("vote_phase_secs", secs)?;
    }
    Ok(())
}

pub fn validate_update_session(req: &UpdateSessionRequest) -> Result<(), SessionError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(max) = req.max_submissions {
        validate_max_submissions(max)?;
    }
    if let Some(secs) = req.submission_phase_secs {
        validate_phase_secs("submission_phase_secs", secs)?;
    }
    if let Some(secs) = req.vote_phase_secs {
        validate_phase_secs("vote_phase_secs", secs)?;
    }
    Ok(())
}
