use crate::common::{TestApp, routes};

/// Session with max 5 submissions (2 votes each) and nominations `t1`..`t4`
/// by user 2, already in the vote phase. Returns the session and submission ids.
async fn session_in_vote_phase(app: &TestApp) -> (i32, Vec<i32>) {
    let id = app.create_session(1, 5).await;
    let mut subs = Vec::new();
    for n in 1..=4 {
        subs.push(app.submit(id, 2, &format!("t{n}")).await);
    }
    app.enter_vote_phase();
    (id, subs)
}

#[tokio::test]
async fn voting_is_closed_during_submission() {
    let app = TestApp::spawn().await;
    let id = app.create_session(1, 5).await;
    let sub = app.submit(id, 2, "t1").await;

    let res = app.put(&routes::vote(id, sub), 3).await;

    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "WRONG_PHASE");
}

#[tokio::test]
async fn vote_returns_the_candidate() {
    let app = TestApp::spawn().await;
    let (id, subs) = session_in_vote_phase(&app).await;

    let res = app.put(&routes::vote(id, subs[0]), 3).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["submission"]["id"], subs[0]);
    assert_eq!(res.body["track"]["name"], "Track 1");
    assert_eq!(res.body["vote"]["user_id"], 3);
}

#[tokio::test]
async fn revoting_is_idempotent() {
    let app = TestApp::spawn().await;
    let (id, subs) = session_in_vote_phase(&app).await;

    app.vote(id, 3, subs[0]).await;
    app.vote(id, 3, subs[0]).await;
    app.vote(id, 3, subs[1]).await;

    let res = app.get(&routes::session_view(id), 3).await;
    assert_eq!(res.body["votes_left"], 0);
}

#[tokio::test]
async fn vote_quota_is_half_the_submission_quota() {
    let app = TestApp::spawn().await;
    let (id, subs) = session_in_vote_phase(&app).await;
    app.vote(id, 3, subs[0]).await;
    app.vote(id, 3, subs[1]).await;

    let res = app.put(&routes::vote(id, subs[2]), 3).await;

    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "NO_VOTES_LEFT");
}

#[tokio::test]
async fn withdrawing_frees_a_vote() {
    let app = TestApp::spawn().await;
    let (id, subs) = session_in_vote_phase(&app).await;
    app.vote(id, 3, subs[0]).await;
    app.vote(id, 3, subs[1]).await;

    let res = app.delete(&routes::vote(id, subs[0]), 3).await;
    assert_eq!(res.status, 200);
    assert!(res.body["vote"].is_null());

    // Withdrawing again is a no-op.
    let res = app.delete(&routes::vote(id, subs[0]), 3).await;
    assert_eq!(res.status, 200);

    app.vote(id, 3, subs[2]).await;
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let app = TestApp::spawn().await;
    let (id, _) = session_in_vote_phase(&app).await;

    let res = app.put(&routes::vote(id, 9999), 3).await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn self_votes_are_allowed() {
    let app = TestApp::spawn().await;
    let (id, subs) = session_in_vote_phase(&app).await;

    let res = app.put(&routes::vote(id, subs[0]), 2).await;

    assert_eq!(res.status, 200);
}

mod candidates {
    use super::*;

    #[tokio::test]
    async fn list_carries_only_the_viewers_votes() {
        let app = TestApp::spawn().await;
        let (id, subs) = session_in_vote_phase(&app).await;
        app.vote(id, 3, subs[1]).await;
        app.vote(id, 4, subs[2]).await;

        let res = app.get(&routes::candidates(id), 3).await;

        assert_eq!(res.status, 200);
        let candidates = res.body.as_array().unwrap();
        assert_eq!(candidates.len(), 4);
        let voted: Vec<bool> = candidates.iter().map(|c| !c["vote"].is_null()).collect();
        assert_eq!(voted, [false, true, false, false]);
        assert!(candidates.iter().all(|c| c["track"]["id"].is_string()));
    }

    #[tokio::test]
    async fn single_candidate_matches_the_list() {
        let app = TestApp::spawn().await;
        let (id, subs) = session_in_vote_phase(&app).await;
        app.vote(id, 3, subs[2]).await;

        let list = app.get(&routes::candidates(id), 3).await;
        for (i, sub) in subs.iter().enumerate() {
            let one = app.get(&routes::candidate(id, *sub), 3).await;
            assert_eq!(one.status, 200);
            assert_eq!(one.body, list.body[i]);
        }
    }

    #[tokio::test]
    async fn candidate_of_another_session_is_not_found() {
        let app = TestApp::spawn().await;
        let (id, subs) = session_in_vote_phase(&app).await;
        let other = app.create_session(1, 5).await;

        let res = app.get(&routes::candidate(other, subs[0]), 3).await;
        assert_eq!(res.status, 404);

        let res = app.get(&routes::candidate(id, subs[0]), 3).await;
        assert_eq!(res.status, 200);
    }
}
