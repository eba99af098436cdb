use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/sessions", session_routes())
        .nest("/tracks", track_routes())
}

fn session_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::session::list_sessions,
            handlers::session::create_session
        ))
        .routes(routes!(
            handlers::session::get_session,
            handlers::session::update_session,
            handlers::session::delete_session
        ))
        .routes(routes!(handlers::session::get_session_view))
        .routes(routes!(handlers::session::get_results))
        .routes(routes!(
            handlers::submission::list_my_submissions,
            handlers::submission::add_submission
        ))
        .routes(routes!(handlers::submission::remove_submission))
        .routes(routes!(handlers::vote::list_candidates))
        .routes(routes!(handlers::vote::get_candidate))
        .routes(routes!(handlers::vote::vote, handlers::vote::remove_vote))
        .routes(routes!(
            handlers::playlist::get_playlist,
            handlers::playlist::create_playlist,
            handlers::playlist::delete_playlist
        ))
}

fn track_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::track::search_tracks))
}
