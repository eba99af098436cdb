//! Publishing a session's ranking as a provider playlist.

use std::collections::HashMap;

use common::store::StoreError;
use common::{NewPlaylist, Phase, Playlist};
use tracing::{info, instrument, warn};

use super::error::SessionError;
use super::service::{SessionService, require_owner};

impl SessionService {
    /// Create the provider playlist for a finished session.
    ///
    /// Tracks follow the ranking; a track nominated more than once appears
    /// once, at its best place. Calling again returns the existing playlist.
    ///
    /// Two concurrent first calls may both reach the provider. Only one
    /// record is kept; the other provider playlist stays at the provider and
    /// its ID is logged.
    #[instrument(skip(self))]
    pub async fn create_results_playlist(
        &self,
        session_id: i32,
        user_id: i32,
    ) -> Result<Playlist, SessionError> {
        let session = self.load_session(session_id).await?;
        require_owner(session.created_by, user_id)?;
        self.require_phase(&session, Phase::Result)?;

        if let Some(existing) = self.store.find_playlist(session_id).await? {
            return Ok(existing);
        }

        let ranked = self.ranked_results(&session).await?;
        let track_by_submission: HashMap<i32, String> = self
            .store
            .list_submissions(session_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s.track_id))
            .collect();

        let mut track_ids: Vec<String> = Vec::with_capacity(ranked.len());
        for result in &ranked {
            if let Some(track_id) = track_by_submission.get(&result.submission_id)
                && !track_ids.contains(track_id)
            {
                track_ids.push(track_id.clone());
            }
        }
        if track_ids.is_empty() {
            return Err(SessionError::Validation(
                "session has no voted tracks to publish".into(),
            ));
        }

        let remote = self.catalog.create_playlist(&session.name, &track_ids).await?;
        let provider_id = remote.id.clone();
        let created = self
            .store
            .add_playlist(NewPlaylist {
                session_id,
                provider_id: remote.id,
                name: remote.name,
                url: remote.url,
                track_ids,
                created_at: self.now(),
            })
            .await;

        match created {
            Ok(playlist) => {
                info!(playlist_id = playlist.id, provider_id = %playlist.provider_id, "Playlist created");
                Ok(playlist)
            }
            // Lost a race with a concurrent publish; keep the winner's record.
            Err(StoreError::Conflict(_)) => {
                warn!(
                    session_id,
                    orphaned_provider_id = %provider_id,
                    "Concurrent publish won; provider playlist left unreferenced"
                );
                self.store
                    .find_playlist(session_id)
                    .await?
                    .ok_or(SessionError::PlaylistNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_playlist(&self, session_id: i32) -> Result<Playlist, SessionError> {
        self.load_session(session_id).await?;
        self.store
            .find_playlist(session_id)
            .await?
            .ok_or(SessionError::PlaylistNotFound)
    }

    /// Forget the session's playlist record. The provider copy is left alone.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, session_id: i32, user_id: i32) -> Result<(), SessionError> {
        let session = self.load_session(session_id).await?;
        require_owner(session.created_by, user_id)?;

        if !self.store.delete_playlist(session_id).await? {
            return Err(SessionError::PlaylistNotFound);
        }
        info!(session_id, "Playlist deleted");
        Ok(())
    }
}
