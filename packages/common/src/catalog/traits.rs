use async_trait::async_trait;

use super::error::CatalogError;
use super::types::{CatalogPlaylist, Track};

/// Music-streaming provider: track lookup and playlist publishing.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Free-text track search.
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>, CatalogError>;

    /// Look up one track. Fails with `NotFound` for unknown IDs.
    async fn get_track(&self, id: &str) -> Result<Track, CatalogError>;

    /// Look up several tracks. Unknown IDs are left out of the answer.
    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<Track>, CatalogError> {
        let mut tracks = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_track(id).await {
                Ok(track) => tracks.push(track),
                Err(CatalogError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(tracks)
    }

    /// Create a playlist containing `track_ids` in order.
    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<CatalogPlaylist, CatalogError>;

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError>;
}
