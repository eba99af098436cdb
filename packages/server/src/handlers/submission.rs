use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Submission;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::session::AddSubmissionRequest;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "addSubmission",
    summary = "Nominate a track",
    description = "Adds a track to the session on behalf of the caller. Only allowed in the submission phase. The track must exist in the music catalog, the caller must have quota left, and may not nominate the same track twice. `track_id` must be a bare catalog ID (letters and digits); the stored ID is the catalog's canonical one.",
    params(("id" = i32, Path, description = "Session ID")),
    request_body = AddSubmissionRequest,
    responses(
        (status = 201, description = "Submission accepted", body = Submission),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session or track not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Rejected (WRONG_PHASE, NO_SUBMISSIONS_LEFT, DUPLICATE_SUBMISSION)", body = ErrorBody),
        (status = 502, description = "Music provider failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(track_id = %payload.track_id, user = %auth_user.username)
)]
pub async fn add_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AddSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = state
        .sessions
        .add_submission(id, auth_user.user_id, &payload.track_id)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "listMySubmissions",
    summary = "List the caller's submissions",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "The caller's submissions, oldest first", body = Vec<Submission>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn list_my_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let submissions = state
        .sessions
        .user_submissions(id, auth_user.user_id)
        .await?;
    Ok(Json(submissions))
}

#[utoipa::path(
    delete,
    path = "/{id}/submissions/{submission_id}",
    tag = "Submissions",
    operation_id = "removeSubmission",
    summary = "Withdraw a nomination",
    description = "Removes one of the caller's own submissions, together with any votes it received. Only allowed in the submission phase.",
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 204, description = "Submission removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the caller's submission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session or submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Wrong phase (WRONG_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn remove_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, submission_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove_submission(id, auth_user.user_id, submission_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
