use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::Session;

/// Lifecycle phase of a session, derived from wall-clock time.
///
/// Phases are strictly ordered: `Submission < Vote < Result`. `Result` is a
/// sink; once reached, a session never leaves it for the same schedule.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum Phase {
    /// Users nominate tracks.
    Submission,
    /// Users vote on nominations.
    Vote,
    /// Voting is closed and results are visible.
    Result,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: &'static [Phase] = &[Self::Submission, Self::Vote, Self::Result];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "Submission",
            Self::Vote => "Vote",
            Self::Result => "Result",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start time plus the two phase lengths of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    pub start_at: DateTime<Utc>,
    pub submission_phase: Duration,
    pub vote_phase: Duration,
}

impl PhaseSchedule {
    pub fn new(start_at: DateTime<Utc>, submission_phase: Duration, vote_phase: Duration) -> Self {
        Self {
            start_at,
            submission_phase,
            vote_phase,
        }
    }

    /// Combined length of the submission and vote phases.
    fn open_window(&self) -> Duration {
        self.submission_phase
            .checked_add(&self.vote_phase)
            .unwrap_or(Duration::MAX)
    }

    /// Phase at `now`. Recomputed on every call, never cached.
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        let elapsed = now - self.start_at;
        if elapsed < self.submission_phase {
            Phase::Submission
        } else if elapsed < self.open_window() {
            Phase::Vote
        } else {
            Phase::Result
        }
    }

    /// Time left until the current phase ends. Zero in the `Result` phase.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = now - self.start_at;
        match self.phase_at(now) {
            Phase::Submission => self.submission_phase - elapsed,
            Phase::Vote => self.open_window() - elapsed,
            Phase::Result => Duration::zero(),
        }
    }

    pub fn submission_ends_at(&self) -> DateTime<Utc> {
        self.start_at
            .checked_add_signed(self.submission_phase)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn vote_ends_at(&self) -> DateTime<Utc> {
        self.start_at
            .checked_add_signed(self.open_window())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Phase of `session` at `now`.
pub fn phase(session: &Session, now: DateTime<Utc>) -> Phase {
    session.schedule().phase_at(now)
}

/// Time left in the current phase of `session` at `now`.
pub fn remaining_phase_duration(session: &Session, now: DateTime<Utc>) -> Duration {
    session.schedule().remaining(now)
}
