use axum::Json;
use axum::extract::{Path, State};
use common::Candidate;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/candidates",
    tag = "Candidates",
    operation_id = "listCandidates",
    summary = "List candidates",
    description = "Every submission in the session with track metadata and the caller's own vote, if any.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Candidates, oldest submission first", body = Vec<Candidate>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Music provider failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn list_candidates(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let candidates = state
        .sessions
        .user_candidates(id, auth_user.user_id)
        .await?;
    Ok(Json(candidates))
}

#[utoipa::path(
    get,
    path = "/{id}/candidates/{submission_id}",
    tag = "Candidates",
    operation_id = "getCandidate",
    summary = "Get one candidate",
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 200, description = "Candidate", body = Candidate),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Submission not found in this session (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn get_candidate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, submission_id)): Path<(i32, i32)>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state
        .sessions
        .get_candidate(id, auth_user.user_id, submission_id)
        .await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    put,
    path = "/{id}/candidates/{submission_id}/vote",
    tag = "Candidates",
    operation_id = "voteForCandidate",
    summary = "Vote for a candidate",
    description = "Casts the caller's vote for a submission. Only allowed in the vote phase. Voting again for the same submission is a no-op and does not use quota.",
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 200, description = "Candidate with the caller's vote", body = Candidate),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session or submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Rejected (WRONG_PHASE, NO_VOTES_LEFT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, submission_id)): Path<(i32, i32)>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state
        .sessions
        .vote_for_candidate(id, auth_user.user_id, submission_id)
        .await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/{id}/candidates/{submission_id}/vote",
    tag = "Candidates",
    operation_id = "removeVote",
    summary = "Withdraw a vote",
    description = "Removes the caller's vote for a submission, if there is one. Only allowed in the vote phase.",
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 200, description = "Candidate without the caller's vote", body = Candidate),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session or submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Wrong phase (WRONG_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn remove_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, submission_id)): Path<(i32, i32)>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state
        .sessions
        .remove_vote_for_candidate(id, auth_user.user_id, submission_id)
        .await?;
    Ok(Json(candidate))
}
