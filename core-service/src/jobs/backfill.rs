use crate::error::Result;
use core_history::PlayEventRepository;
use provider_spotify::SpotifyApi;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Track ids found without artwork
    pub candidates: usize,
    /// Track ids that received images
    pub updated: usize,
    /// Stored plays touched
    pub rows_patched: u64,
}

/// Best-effort fill of missing album artwork from track details.
pub struct ArtworkBackfillJob {
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn PlayEventRepository>,
    limit: usize,
}

impl ArtworkBackfillJob {
    pub fn new(api: Arc<dyn SpotifyApi>, store: Arc<dyn PlayEventRepository>, limit: usize) -> Self {
        Self { api, store, limit }
    }

    #[instrument(skip(self), fields(limit = self.limit))]
    pub async fn run(&self) -> Result<BackfillReport> {
        let missing = self.store.find_track_ids_missing_artwork(self.limit).await?;
        let mut report = BackfillReport {
            candidates: missing.len(),
            ..Default::default()
        };

        if missing.is_empty() {
            info!("No tracks missing images");
            return Ok(report);
        }

        let details = self.api.fetch_track_details(&missing).await?;

        for track_id in &missing {
            let Some(track) = details.get(track_id) else {
                continue;
            };
            if track.album.images.is_empty() {
                debug!(track_id = %track_id, "Track has no album images upstream");
                continue;
            }

            report.rows_patched += self
                .store
                .patch_album_artwork(track_id, &track.album.images)
                .await?;
            report.updated += 1;
        }

        info!(
            candidates = report.candidates,
            updated = report.updated,
            rows = report.rows_patched,
            "Backfilled album images"
        );
        Ok(report)
    }
}
