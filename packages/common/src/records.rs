use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::{Phase, PhaseSchedule};
use crate::quota;
use crate::tally::RankedResult;

/// A timed nomination contest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Session {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Summer bangers")]
    pub name: String,
    /// User ID of the creator.
    #[schema(example = 7)]
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the submission phase opens.
    pub start_at: DateTime<Utc>,
    /// Per-user nomination limit.
    #[schema(example = 5)]
    pub max_submissions: i32,
    /// Length of the submission phase in seconds.
    #[schema(example = 432000)]
    pub submission_phase_secs: i64,
    /// Length of the vote phase in seconds.
    #[schema(example = 432000)]
    pub vote_phase_secs: i64,
    /// Tally snapshot, written once after the session enters the result phase.
    #[serde(skip)]
    pub results: Option<Vec<RankedResult>>,
}

impl Session {
    pub fn submission_phase(&self) -> Duration {
        Duration::try_seconds(self.submission_phase_secs).unwrap_or(Duration::MAX)
    }

    pub fn vote_phase(&self) -> Duration {
        Duration::try_seconds(self.vote_phase_secs).unwrap_or(Duration::MAX)
    }

    pub fn schedule(&self) -> PhaseSchedule {
        PhaseSchedule::new(self.start_at, self.submission_phase(), self.vote_phase())
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        self.schedule().phase_at(now)
    }

    pub fn max_votes(&self) -> i32 {
        quota::max_votes(self.max_submissions)
    }

    /// Returns true once the tally snapshot has been persisted.
    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }
}

/// Fully resolved input for creating a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSession {
    pub name: String,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub start_at: DateTime<Utc>,
    pub max_submissions: i32,
    pub submission_phase_secs: i64,
    pub vote_phase_secs: i64,
}

/// A user's nominated track within a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Submission {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = 1)]
    pub session_id: i32,
    #[schema(example = 7)]
    pub user_id: i32,
    /// Catalog track identifier.
    #[schema(example = "4uLU6hMCjMI75M1A2tKUQC")]
    pub track_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSubmission {
    pub session_id: i32,
    pub user_id: i32,
    pub track_id: String,
    pub created_at: DateTime<Utc>,
}

/// A user's endorsement of one submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Vote {
    #[schema(example = 1)]
    pub session_id: i32,
    #[schema(example = 7)]
    pub user_id: i32,
    #[schema(example = 12)]
    pub submission_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Provider playlist published from a session's results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Playlist {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub session_id: i32,
    /// Playlist identifier at the catalog provider.
    #[schema(example = "37i9dQZF1DXcBWIGoYBM5M")]
    pub provider_id: String,
    pub name: String,
    pub url: Option<String>,
    /// Track identifiers in ranking order.
    pub track_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlaylist {
    pub session_id: i32,
    pub provider_id: String,
    pub name: String,
    pub url: Option<String>,
    pub track_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}
