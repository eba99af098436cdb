use crate::common::{TestApp, routes};
use serde_json::{Value, json};

/// Nominations A..D = t1..t4 and votes 3, 3, 1, 0. Returns the session and
/// submission ids, with the clock in the result phase.
async fn tallied_session(app: &TestApp) -> (i32, [i32; 4]) {
    let id = app.create_session(1, 5).await;
    let a = app.submit(id, 2, "t1").await;
    let b = app.submit(id, 2, "t2").await;
    let c = app.submit(id, 3, "t3").await;
    let d = app.submit(id, 3, "t4").await;

    app.enter_vote_phase();
    for voter in [4, 5, 6] {
        app.vote(id, voter, a).await;
        app.vote(id, voter, b).await;
    }
    app.vote(id, 7, c).await;

    app.enter_result_phase();
    (id, [a, b, c, d])
}

fn ranking(body: &Value) -> Vec<(i64, i64, i64)> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["submission"]["id"].as_i64().unwrap(),
                r["score"].as_i64().unwrap(),
                r["place"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn not_available_while_voting() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    app.enter_vote_phase();

    let res = app.get(&routes::results(id), 1).await;

    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "WRONG_PHASE");
}

#[tokio::test]
async fn ties_share_a_place_and_unvoted_are_left_out() {
    let app = TestApp::spawn().await;
    let (id, [a, b, c, _d]) = tallied_session(&app).await;

    let res = app.get(&routes::results(id), 2).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        ranking(&res.body),
        [(a as i64, 3, 1), (b as i64, 3, 1), (c as i64, 1, 2)]
    );
    assert_eq!(res.body[0]["track"]["id"], "t1");
}

#[tokio::test]
async fn results_are_a_stable_snapshot() {
    let app = TestApp::spawn().await;
    let (id, _) = tallied_session(&app).await;

    let first = app.get(&routes::results(id), 1).await;
    app.advance(86_400);
    let second = app.get(&routes::results(id), 1).await;

    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn empty_session_has_empty_results() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    app.enter_result_phase();

    let res = app.get(&routes::results(id), 1).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn view_includes_results_once_final() {
    let app = TestApp::spawn().await;
    let (id, [a, ..]) = tallied_session(&app).await;

    let res = app.get(&routes::session_view(id), 4).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["phase"], "Result");
    assert_eq!(res.body["remaining_secs"], 0);
    assert_eq!(res.body["votes_left"], 0);
    assert_eq!(res.body["submissions_left"], 5);
    assert_eq!(res.body["user_candidates"].as_array().unwrap().len(), 4);
    assert_eq!(res.body["results"][0]["submission"]["id"], a);
}

#[tokio::test]
async fn view_has_no_results_before_the_end() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    app.submit(id, 2, "t1").await;

    let res = app.get(&routes::session_view(id), 2).await;

    assert_eq!(res.body["phase"], "Submission");
    assert_eq!(res.body["submissions_left"], 4);
    assert_eq!(res.body["votes_left"], 2);
    assert_eq!(res.body["user_submissions"][0]["track_id"], "t1");
    assert!(res.body["results"].is_null());
}

#[tokio::test]
async fn schedule_is_frozen_after_results_but_name_is_not() {
    let app = TestApp::spawn().await;
    let (id, _) = tallied_session(&app).await;
    app.get(&routes::results(id), 1).await;

    let res = app
        .patch(&routes::session(id), &json!({ "vote_phase_secs": 999999 }), 1)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "RESULTS_FINALIZED");

    let res = app
        .patch(&routes::session(id), &json!({ "name": "Final" }), 1)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "Final");
}
