use thiserror::Error;

use crate::quota::QuotaViolation;

/// Errors returned by a [`SessionStore`](super::SessionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record a write depends on does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// A write guard refused the insert.
    #[error(transparent)]
    Rejected(#[from] QuotaViolation),
    /// A uniqueness rule was violated by the backend.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backend failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "sea-orm")]
impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Backend(err.to_string()),
        }
    }
}
