use axum::Json;
use axum::extract::State;
use common::catalog::Track;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::models::session::TrackSearchQuery;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/search",
    tag = "Tracks",
    operation_id = "searchTracks",
    summary = "Search the music catalog",
    params(TrackSearchQuery),
    responses(
        (status = 200, description = "Matching tracks", body = Vec<Track>),
        (status = 400, description = "Empty query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Music provider failed (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query), fields(q = %query.q))]
pub async fn search_tracks(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TrackSearchQuery>,
) -> Result<Json<Vec<Track>>, AppError> {
    Ok(Json(state.sessions.search_tracks(&query.q).await?))
}
