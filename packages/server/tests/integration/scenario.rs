//! Whole-session walks against the service, without HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use common::catalog::{CatalogError, CatalogPlaylist, Track, TrackCatalog};
use common::clock::Clock;
use common::store::{MemoryStore, SessionStore};
use common::{NewPlaylist, Phase, QuotaViolation, Vote};
use server::models::session::CreateSessionRequest;
use server::session::SessionError;

use crate::common::{FakeCatalog, service_with, test_service};

fn request(max_submissions: i32) -> CreateSessionRequest {
    CreateSessionRequest {
        name: "Road trip".into(),
        max_submissions: Some(max_submissions),
        submission_phase_secs: Some(600),
        vote_phase_secs: Some(600),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_session_walk() {
    let (service, clock, _) = test_service();
    let session = service.create_session(1, request(5)).await.unwrap();
    assert_eq!(session.phase_at(clock.now()), Phase::Submission);

    let mut subs = Vec::new();
    for n in 1..=5 {
        subs.push(
            service
                .add_submission(session.id, 2, &format!("t{n}"))
                .await
                .unwrap(),
        );
    }
    let err = service
        .add_submission(session.id, 2, "t6")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Quota(QuotaViolation::NoSubmissionsLeft)
    ));

    clock.advance(Duration::seconds(600));
    let view = service.get_session_view(session.id, 3).await.unwrap();
    assert_eq!(view.session.phase, Phase::Vote);
    assert_eq!(view.votes_left, 2);

    service
        .vote_for_candidate(session.id, 3, subs[4].id)
        .await
        .unwrap();
    service
        .vote_for_candidate(session.id, 4, subs[4].id)
        .await
        .unwrap();
    service
        .vote_for_candidate(session.id, 4, subs[0].id)
        .await
        .unwrap();

    let err = service.results(session.id).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::WrongPhase {
            expected: Phase::Result,
            actual: Phase::Vote
        }
    ));

    clock.advance(Duration::seconds(600));
    let results = service.results(session.id).await.unwrap();
    let ranking: Vec<(i32, u32, i32)> = results
        .iter()
        .map(|r| (r.submission.id, r.score, r.place))
        .collect();
    assert_eq!(ranking, [(subs[4].id, 2, 1), (subs[0].id, 1, 2)]);
    assert_eq!(results[0].track.as_ref().unwrap().id, "t5");
}

#[tokio::test]
async fn snapshot_survives_edits() {
    let (service, clock, _) = test_service();
    let session = service.create_session(1, request(5)).await.unwrap();
    let a = service.add_submission(session.id, 2, "t1").await.unwrap();
    let b = service.add_submission(session.id, 2, "t2").await.unwrap();

    clock.advance(Duration::seconds(600));
    service.vote_for_candidate(session.id, 3, a.id).await.unwrap();

    clock.advance(Duration::seconds(600));
    let first = service.results(session.id).await.unwrap();

    let err = service
        .update_session(
            session.id,
            1,
            server::models::session::UpdateSessionRequest {
                start_at: Some(clock.now()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ResultsFinalized));

    service
        .update_session(
            session.id,
            1,
            server::models::session::UpdateSessionRequest {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let second = service.results(session.id).await.unwrap();
    assert_eq!(first, second);
    assert!(second.iter().all(|r| r.submission.id != b.id));
}

#[tokio::test]
async fn wrong_phase_errors_name_both_phases() {
    let (service, _, _) = test_service();
    let session = service.create_session(1, request(5)).await.unwrap();
    let sub = service.add_submission(session.id, 2, "t1").await.unwrap();

    let err = service
        .vote_for_candidate(session.id, 3, sub.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::WrongPhase {
            expected: Phase::Vote,
            actual: Phase::Submission
        }
    ));
}

#[tokio::test]
async fn only_the_owner_withdraws_a_submission() {
    let (service, clock, _) = test_service();
    let session = service.create_session(1, request(5)).await.unwrap();
    let sub = service.add_submission(session.id, 2, "t1").await.unwrap();

    let err = service
        .remove_submission(session.id, 3, sub.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Unauthorized));

    service
        .remove_submission(session.id, 2, sub.id)
        .await
        .unwrap();
    let candidates = service.user_candidates(session.id, 3).await.unwrap();
    assert!(candidates.is_empty());

    clock.advance(Duration::seconds(1200));
    assert!(service.results(session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_ignores_votes_written_after_it() {
    let store = Arc::new(MemoryStore::new());
    let (service, clock) = service_with(store.clone(), Arc::new(FakeCatalog::default()));
    let session = service.create_session(1, request(5)).await.unwrap();
    let a = service.add_submission(session.id, 2, "t1").await.unwrap();
    let b = service.add_submission(session.id, 2, "t2").await.unwrap();

    clock.advance(Duration::seconds(600));
    service.vote_for_candidate(session.id, 3, a.id).await.unwrap();

    clock.advance(Duration::seconds(600));
    let first = service.results(session.id).await.unwrap();

    for user_id in [4, 5] {
        let late = Vote {
            session_id: session.id,
            user_id,
            submission_id: b.id,
            created_at: clock.now(),
        };
        store.add_vote(late, &|_: &[Vote]| Ok(())).await.unwrap();
    }

    let second = service.results(session.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].submission.id, a.id);
}

/// Catalog that lets a competing publish of the session land while its own
/// provider playlist is being created.
struct RacingCatalog {
    inner: FakeCatalog,
    store: Arc<MemoryStore>,
}

#[async_trait]
impl TrackCatalog for RacingCatalog {
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        self.inner.search_tracks(query).await
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        self.inner.get_track(id).await
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<CatalogPlaylist, CatalogError> {
        let session = self.store.list_sessions(0, 1).await.unwrap().remove(0);
        self.store
            .add_playlist(NewPlaylist {
                session_id: session.id,
                provider_id: "winner".into(),
                name: name.to_string(),
                url: None,
                track_ids: track_ids.to_vec(),
                created_at: session.start_at,
            })
            .await
            .unwrap();
        self.inner.create_playlist(name, track_ids).await
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError> {
        self.inner.get_playlist(id).await
    }
}

#[tokio::test]
async fn losing_a_publish_race_returns_the_winning_playlist() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(RacingCatalog {
        inner: FakeCatalog::default(),
        store: store.clone(),
    });
    let (service, clock) = service_with(store, catalog.clone());
    let session = service.create_session(1, request(5)).await.unwrap();
    let sub = service.add_submission(session.id, 2, "t1").await.unwrap();
    clock.advance(Duration::seconds(600));
    service.vote_for_candidate(session.id, 3, sub.id).await.unwrap();
    clock.advance(Duration::seconds(600));

    let playlist = service.create_results_playlist(session.id, 1).await.unwrap();

    assert_eq!(playlist.provider_id, "winner");
    assert_eq!(service.get_playlist(session.id).await.unwrap(), playlist);
    // The losing call still created its own copy at the provider.
    assert_eq!(catalog.inner.created_playlists().len(), 1);
}
