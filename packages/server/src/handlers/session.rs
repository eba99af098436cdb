use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::session::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Sessions",
    operation_id = "createSession",
    summary = "Create a new session",
    description = "Creates a nomination session owned by the caller. Omitted fields fall back to the server defaults; `start_at` defaults to now.",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(name = %payload.name, user = %auth_user.username)
)]
pub async fn create_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .create_session(auth_user.user_id, payload)
        .await?;
    let now = state.sessions.now();

    Ok((StatusCode::CREATED, Json(SessionResponse::at(session, now))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Sessions",
    operation_id = "listSessions",
    summary = "List sessions",
    description = "Returns a page of sessions, newest start first.",
    params(SessionListQuery),
    responses(
        (status = 200, description = "List of sessions", body = SessionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_sessions(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SessionListQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let (sessions, pagination) = state
        .sessions
        .list_sessions(query.page, query.per_page)
        .await?;
    let now = state.sessions.now();

    let data = sessions
        .into_iter()
        .map(|s| SessionResponse::at(s, now))
        .collect();

    Ok(Json(SessionListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sessions",
    operation_id = "getSession",
    summary = "Get session details",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_session(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.get_session(id).await?;
    Ok(Json(SessionResponse::at(session, state.sessions.now())))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Sessions",
    operation_id = "updateSession",
    summary = "Update a session",
    description = "Partially updates a session. Only the creator may edit it. Once results have been computed the schedule and quota are frozen; the name can still change.",
    params(("id" = i32, Path, description = "Session ID")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Results are final (RESULTS_FINALIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn update_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if payload == UpdateSessionRequest::default() {
        return Err(AppError::Validation(
            "At least one field must be provided".into(),
        ));
    }

    let session = state
        .sessions
        .update_session(id, auth_user.user_id, payload)
        .await?;
    Ok(Json(SessionResponse::at(session, state.sessions.now())))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Sessions",
    operation_id = "deleteSession",
    summary = "Delete a session",
    description = "Deletes a session with all of its submissions, votes and playlist record. Only the creator may delete it.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn delete_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete_session(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/view",
    tag = "Sessions",
    operation_id = "getSessionView",
    summary = "Get the caller's view of a session",
    description = "Returns the session, its current phase and remaining time, the caller's remaining quota, their own submissions, every candidate with the caller's vote state, and the ranked results once the session is in the result phase.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session view", body = SessionView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Music provider failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn get_session_view(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .get_session_view(id, auth_user.user_id)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/{id}/results",
    tag = "Sessions",
    operation_id = "getSessionResults",
    summary = "Get ranked results",
    description = "Returns the ranked results of a session in the result phase. The first request after voting closes takes a snapshot; later requests return it unchanged. Submissions without votes are not listed.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Ranked results", body = Vec<ResultEntry>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Voting still open (WRONG_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_results(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ResultEntry>>, AppError> {
    Ok(Json(state.sessions.results(id).await?))
}
