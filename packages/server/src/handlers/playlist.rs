use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Playlist;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/playlist",
    tag = "Playlists",
    operation_id = "createResultsPlaylist",
    summary = "Publish results as a playlist",
    description = "Creates a playlist at the music provider holding the ranked tracks, best first. Only the creator may publish, and only in the result phase. Publishing again returns the existing playlist.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Playlist", body = Playlist),
        (status = 400, description = "Nothing to publish (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Voting still open (WRONG_PHASE)", body = ErrorBody),
        (status = 502, description = "Music provider failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn create_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let playlist = state
        .sessions
        .create_results_playlist(id, auth_user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

#[utoipa::path(
    get,
    path = "/{id}/playlist",
    tag = "Playlists",
    operation_id = "getPlaylist",
    summary = "Get the results playlist",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Playlist", body = Playlist),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Session or playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_playlist(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Playlist>, AppError> {
    Ok(Json(state.sessions.get_playlist(id).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}/playlist",
    tag = "Playlists",
    operation_id = "deletePlaylist",
    summary = "Forget the results playlist",
    description = "Deletes the session's playlist record so it can be published again. The playlist at the provider is not touched.",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Playlist record deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Session or playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn delete_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete_playlist(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
