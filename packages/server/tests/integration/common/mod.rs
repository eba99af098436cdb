use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::catalog::{CatalogError, CatalogPlaylist, Track, TrackCatalog};
use common::clock::ManualClock;
use common::config::SessionDefaults;
use common::store::MemoryStore;
use reqwest::Client;
use serde_json::Value;

use server::config::{
    AppConfig, AuthConfig, CatalogConfig, CorsConfig, DatabaseConfig, ServerConfig,
};
use server::session::SessionService;
use server::state::AppState;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const SESSIONS: &str = "/api/v1/sessions";

    pub fn session(id: i32) -> String {
        format!("/api/v1/sessions/{id}")
    }

    pub fn session_view(id: i32) -> String {
        format!("/api/v1/sessions/{id}/view")
    }

    pub fn submissions(id: i32) -> String {
        format!("/api/v1/sessions/{id}/submissions")
    }

    pub fn submission(id: i32, submission_id: i32) -> String {
        format!("/api/v1/sessions/{id}/submissions/{submission_id}")
    }

    pub fn candidates(id: i32) -> String {
        format!("/api/v1/sessions/{id}/candidates")
    }

    pub fn candidate(id: i32, submission_id: i32) -> String {
        format!("/api/v1/sessions/{id}/candidates/{submission_id}")
    }

    pub fn vote(id: i32, submission_id: i32) -> String {
        format!("/api/v1/sessions/{id}/candidates/{submission_id}/vote")
    }

    pub fn results(id: i32) -> String {
        format!("/api/v1/sessions/{id}/results")
    }

    pub fn playlist(id: i32) -> String {
        format!("/api/v1/sessions/{id}/playlist")
    }

    pub fn track_search(q: &str) -> String {
        format!("/api/v1/tracks/search?q={q}")
    }
}

/// Phase lengths used by [`TestApp::create_session`].
pub const PHASE_SECS: i64 = 3600;

/// Catalog double holding tracks `t1` .. `t20`.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    playlists: Mutex<Vec<CatalogPlaylist>>,
}

impl FakeCatalog {
    /// Lookups ignore case, like IDs resolved by a real provider; the
    /// canonical ID is lower case.
    fn track(id: &str) -> Option<Track> {
        let id = id.to_ascii_lowercase();
        let n: u32 = id.strip_prefix('t')?.parse().ok()?;
        if !(1..=20).contains(&n) {
            return None;
        }
        Some(Track {
            id: id.clone(),
            name: format!("Track {n}"),
            artists: vec![format!("Artist {n}")],
            album: None,
            duration_ms: 180_000,
            url: Some(format!("https://music.example/track/{id}")),
        })
    }

    pub fn created_playlists(&self) -> Vec<CatalogPlaylist> {
        self.playlists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl TrackCatalog for FakeCatalog {
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        Ok((1..=20)
            .filter_map(|n| Self::track(&format!("t{n}")))
            .filter(|t| t.name.to_lowercase().contains(&query.to_lowercase()))
            .collect())
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        Self::track(id).ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<CatalogPlaylist, CatalogError> {
        let mut playlists = self.playlists.lock().unwrap_or_else(|e| e.into_inner());
        let id = format!("pl{}", playlists.len() + 1);
        let playlist = CatalogPlaylist {
            url: Some(format!("https://music.example/playlist/{id}")),
            id,
            name: name.to_string(),
            track_ids: track_ids.to_vec(),
        };
        playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError> {
        self.created_playlists()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
}

/// Service wired to fresh in-memory collaborators.
pub fn test_service() -> (SessionService, Arc<ManualClock>, Arc<FakeCatalog>) {
    let catalog = Arc::new(FakeCatalog::default());
    let (service, clock) = service_with(Arc::new(MemoryStore::new()), catalog.clone());
    (service, clock, catalog)
}

/// Service over the given store and catalog, for tests that also touch them
/// directly.
pub fn service_with(
    store: Arc<MemoryStore>,
    catalog: Arc<dyn TrackCatalog>,
) -> (SessionService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = SessionService::new(store, catalog, clock.clone(), SessionDefaults::default());
    (service, clock)
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub clock: Arc<ManualClock>,
    pub catalog: Arc<FakeCatalog>,
    tokens: Mutex<HashMap<i32, String>>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let (sessions, clock, catalog) = test_service();

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            session: SessionDefaults::default(),
            catalog: CatalogConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                access_token: String::new(),
                owner_id: "owner".to_string(),
                timeout_secs: 1,
            },
        };

        let app = server::build_router(AppState {
            sessions,
            config: app_config,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            clock,
            catalog,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Bearer token for a user, signed with the test secret.
    pub fn token(&self, user_id: i32) -> String {
        self.tokens
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert_with(|| {
                server::utils::jwt::sign(user_id, &format!("user{user_id}"), JWT_SECRET)
                    .expect("Failed to sign token")
            })
            .clone()
    }

    /// Move the clock `secs` seconds forward.
    pub fn advance(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    /// Move the clock into the vote phase of a session made by [`Self::create_session`].
    pub fn enter_vote_phase(&self) {
        self.clock.set(start_time() + Duration::seconds(PHASE_SECS));
    }

    /// Move the clock into the result phase of a session made by [`Self::create_session`].
    pub fn enter_result_phase(&self) {
        self.clock
            .set(start_time() + Duration::seconds(2 * PHASE_SECS));
    }

    pub async fn post(&self, path: &str, body: &Value, user_id: i32) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(self.token(user_id))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str, user_id: i32) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_raw_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value, user_id: i32) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .bearer_auth(self.token(user_id))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, user_id: i32) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str, user_id: i32) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a session starting now with one-hour phases and return its `id`.
    pub async fn create_session(&self, creator: i32, max_submissions: i32) -> i32 {
        let res = self
            .post(
                routes::SESSIONS,
                &serde_json::json!({
                    "name": "Weekly picks",
                    "start_at": start_time(),
                    "max_submissions": max_submissions,
                    "submission_phase_secs": PHASE_SECS,
                    "vote_phase_secs": PHASE_SECS,
                }),
                creator,
            )
            .await;
        assert_eq!(res.status, 201, "create_session failed: {}", res.text);
        res.id()
    }

    /// Nominate a track and return the submission `id`.
    pub async fn submit(&self, session_id: i32, user_id: i32, track_id: &str) -> i32 {
        let res = self
            .post(
                &routes::submissions(session_id),
                &serde_json::json!({ "track_id": track_id }),
                user_id,
            )
            .await;
        assert_eq!(res.status, 201, "submit failed: {}", res.text);
        res.id()
    }

    pub async fn vote(&self, session_id: i32, user_id: i32, submission_id: i32) {
        let res = self
            .put(&routes::vote(session_id, submission_id), user_id)
            .await;
        assert_eq!(res.status, 200, "vote failed: {}", res.text);
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
