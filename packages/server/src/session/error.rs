use common::catalog::CatalogError;
use common::store::StoreError;
use common::{Phase, QuotaViolation};
use thiserror::Error;

/// Typed outcome of a failed session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("Submission not found")]
    SubmissionNotFound,
    #[error("Playlist not found")]
    PlaylistNotFound,
    #[error("Track '{0}' not found")]
    TrackNotFound(String),
    /// The acting user does not own the resource.
    #[error("Not allowed to modify this resource")]
    Unauthorized,
    #[error("Session is in the {actual} phase, this requires the {expected} phase")]
    WrongPhase { expected: Phase, actual: Phase },
    /// Schedule or quota edits after the tally snapshot was taken.
    #[error("Session results are final")]
    ResultsFinalized,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Quota(QuotaViolation),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(violation) => Self::Quota(violation),
            other => Self::Store(other),
        }
    }
}

impl From<QuotaViolation> for SessionError {
    fn from(violation: QuotaViolation) -> Self {
        Self::Quota(violation)
    }
}
