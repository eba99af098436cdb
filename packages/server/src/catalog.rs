//! Spotify-compatible Web API client.
//!
//! Only the endpoints the sessions need: track search and lookup, playlist
//! creation and playlist lookup. The bearer token is configured, not
//! refreshed here.

use std::time::Duration;

use async_trait::async_trait;
use common::catalog::{CatalogError, CatalogPlaylist, Track, TrackCatalog};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::CatalogConfig;

const SEARCH_LIMIT: u32 = 20;
/// Provider cap on `GET /tracks?ids=`.
const TRACKS_PER_LOOKUP: usize = 50;
/// Provider cap on `POST /playlists/{id}/tracks`.
const TRACKS_PER_APPEND: usize = 100;

// -- wire format ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<WireNamed>,
    album: Option<WireNamed>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Page<WireTrack>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    /// Unknown IDs come back as `null`.
    tracks: Vec<Option<WireTrack>>,
}

#[derive(Debug, Deserialize)]
struct WirePlaylist {
    id: String,
    name: String,
    #[serde(default)]
    external_urls: ExternalUrls,
    tracks: Option<Page<PlaylistItem>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<WireTrackRef>,
}

#[derive(Debug, Deserialize)]
struct WireTrackRef {
    id: Option<String>,
}

#[derive(Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    public: bool,
    description: &'a str,
}

#[derive(Serialize)]
struct AppendTracksBody {
    uris: Vec<String>,
}

impl From<WireTrack> for Track {
    fn from(w: WireTrack) -> Self {
        Track {
            id: w.id,
            name: w.name,
            artists: w.artists.into_iter().map(|a| a.name).collect(),
            album: w.album.map(|a| a.name),
            duration_ms: w.duration_ms,
            url: w.external_urls.spotify,
        }
    }
}

impl From<WirePlaylist> for CatalogPlaylist {
    fn from(w: WirePlaylist) -> Self {
        let track_ids = w
            .tracks
            .map(|page| {
                page.items
                    .into_iter()
                    .filter_map(|item| item.track.and_then(|t| t.id))
                    .collect()
            })
            .unwrap_or_default();
        CatalogPlaylist {
            id: w.id,
            name: w.name,
            url: w.external_urls.spotify,
            track_ids,
        }
    }
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

// -- client -----------------------------------------------------------------

pub struct HttpTrackCatalog {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    owner_id: String,
}

impl HttpTrackCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| CatalogError::Transport(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Transport(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.clone(),
            owner_id: config.owner_id.clone(),
        })
    }

    /// The base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CatalogError::Transport(format!("{} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, CatalogError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Unauthorized),
            s if !s.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(CatalogError::Status {
                    status: s.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, CatalogError> {
        self.send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TrackCatalog for HttpTrackCatalog {
    #[instrument(skip(self))]
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        let limit = SEARCH_LIMIT.to_string();
        let request = self
            .http
            .get(self.endpoint(&["search"])?)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())]);
        let page: SearchResponse = self.send_json(request, query).await?;
        Ok(page.tracks.items.into_iter().map(Track::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        let request = self.http.get(self.endpoint(&["tracks", id])?);
        let track: WireTrack = self.send_json(request, id).await?;
        Ok(track.into())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        let mut tracks = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(TRACKS_PER_LOOKUP) {
            let joined = chunk.join(",");
            let request = self
                .http
                .get(self.endpoint(&["tracks"])?)
                .query(&[("ids", joined.as_str())]);
            let page: TracksResponse = self.send_json(request, &joined).await?;
            tracks.extend(page.tracks.into_iter().flatten().map(Track::from));
        }
        Ok(tracks)
    }

    #[instrument(skip(self, track_ids), fields(count = track_ids.len()))]
    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<CatalogPlaylist, CatalogError> {
        let request = self
            .http
            .post(self.endpoint(&["users", &self.owner_id, "playlists"])?)
            .json(&CreatePlaylistBody {
                name,
                public: false,
                description: "Session results",
            });
        let created: WirePlaylist = self.send_json(request, &self.owner_id).await?;
        debug!(playlist_id = %created.id, "Provider playlist created");

        for chunk in track_ids.chunks(TRACKS_PER_APPEND) {
            let request = self
                .http
                .post(self.endpoint(&["playlists", &created.id, "tracks"])?)
                .json(&AppendTracksBody {
                    uris: chunk.iter().map(|id| track_uri(id)).collect(),
                });
            self.send(request, &created.id).await?;
        }

        let mut playlist = CatalogPlaylist::from(created);
        playlist.track_ids = track_ids.to_vec();
        Ok(playlist)
    }

    #[instrument(skip(self))]
    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError> {
        let request = self.http.get(self.endpoint(&["playlists", id])?);
        let playlist: WirePlaylist = self.send_json(request, id).await?;
        Ok(playlist.into())
    }
}
