use crate::common::{TestApp, routes};
use serde_json::json;

async fn finished_session(app: &TestApp) -> i32 {
    let id = app.create_session(1, 5).await;
    let a = app.submit(id, 2, "t1").await;
    let b = app.submit(id, 3, "t2").await;
    app.submit(id, 3, "t3").await;

    app.enter_vote_phase();
    app.vote(id, 4, b).await;
    app.vote(id, 5, b).await;
    app.vote(id, 5, a).await;

    app.enter_result_phase();
    id
}

#[tokio::test]
async fn creator_publishes_ranked_tracks() {
    let app = TestApp::spawn().await;
    let id = finished_session(&app).await;

    let res = app.post(&routes::playlist(id), &json!({}), 1).await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["session_id"], id);
    assert_eq!(res.body["provider_id"], "pl1");
    assert_eq!(res.body["track_ids"], json!(["t2", "t1"]));
    assert_eq!(app.catalog.created_playlists().len(), 1);
}

#[tokio::test]
async fn publishing_twice_returns_the_same_playlist() {
    let app = TestApp::spawn().await;
    let id = finished_session(&app).await;

    let first = app.post(&routes::playlist(id), &json!({}), 1).await;
    let second = app.post(&routes::playlist(id), &json!({}), 1).await;

    assert_eq!(first.id(), second.id());
    assert_eq!(app.catalog.created_playlists().len(), 1);
}

#[tokio::test]
async fn only_the_creator_publishes() {
    let app = TestApp::spawn().await;
    let id = finished_session(&app).await;

    let res = app.post(&routes::playlist(id), &json!({}), 2).await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn cannot_publish_before_results() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    app.enter_vote_phase();

    let res = app.post(&routes::playlist(id), &json!({}), 1).await;

    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "WRONG_PHASE");
}

#[tokio::test]
async fn nothing_to_publish_without_votes() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    app.submit(id, 2, "t1").await;
    app.enter_result_phase();

    let res = app.post(&routes::playlist(id), &json!({}), 1).await;

    assert_eq!(res.status, 400);
    assert!(app.catalog.created_playlists().is_empty());
}

#[tokio::test]
async fn get_and_delete_playlist() {
    let app = TestApp::spawn().await;
    let id = finished_session(&app).await;

    let res = app.get(&routes::playlist(id), 2).await;
    assert_eq!(res.status, 404);

    app.post(&routes::playlist(id), &json!({}), 1).await;
    let res = app.get(&routes::playlist(id), 2).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "Weekly picks");

    let res = app.delete(&routes::playlist(id), 2).await;
    assert_eq!(res.status, 403);
    let res = app.delete(&routes::playlist(id), 1).await;
    assert_eq!(res.status, 204);
    let res = app.delete(&routes::playlist(id), 1).await;
    assert_eq!(res.status, 404);

    // A deleted record can be published again.
    let res = app.post(&routes::playlist(id), &json!({}), 1).await;
    assert_eq!(res.status, 201);
    assert_eq!(res.body["provider_id"], "pl2");
}
