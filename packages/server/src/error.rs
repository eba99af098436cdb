use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::QuotaViolation;
use common::catalog::CatalogError;
use common::store::StoreError;
use serde::Serialize;

use crate::session::SessionError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`,
    /// `NO_SUBMISSIONS_LEFT`, `DUPLICATE_SUBMISSION`, `NO_VOTES_LEFT`,
    /// `WRONG_PHASE`, `RESULTS_FINALIZED`, `UPSTREAM_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "NO_VOTES_LEFT")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "no votes left in this session")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// A session rule refused the request (quota, phase, finalized results).
    Rejected {
        code: &'static str,
        message: String,
    },
    /// The music provider failed.
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::Rejected { code, message } => {
                (StatusCode::CONFLICT, ErrorBody { code, message })
            }
            AppError::Upstream(detail) => {
                tracing::warn!("Catalog error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "UPSTREAM_ERROR",
                        message: "The music provider request failed".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<QuotaViolation> for AppError {
    fn from(violation: QuotaViolation) -> Self {
        let code = match violation {
            QuotaViolation::NoSubmissionsLeft => "NO_SUBMISSIONS_LEFT",
            QuotaViolation::DuplicateSubmission => "DUPLICATE_SUBMISSION",
            QuotaViolation::NoVotesLeft => "NO_VOTES_LEFT",
        };
        AppError::Rejected {
            code,
            message: violation.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::Rejected(violation) => violation.into(),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(detail) => AppError::Internal(detail),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => AppError::NotFound(format!("'{what}' not found")),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound
            | SessionError::SubmissionNotFound
            | SessionError::PlaylistNotFound
            | SessionError::TrackNotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Unauthorized => AppError::PermissionDenied,
            SessionError::WrongPhase { .. } => AppError::Rejected {
                code: "WRONG_PHASE",
                message: err.to_string(),
            },
            SessionError::ResultsFinalized => AppError::Rejected {
                code: "RESULTS_FINALIZED",
                message: err.to_string(),
            },
            SessionError::Validation(msg) => AppError::Validation(msg),
            SessionError::Quota(violation) => violation.into(),
            SessionError::Store(e) => e.into(),
            SessionError::Catalog(e) => e.into(),
        }
    }
}
