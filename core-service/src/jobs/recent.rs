use crate::error::Result;
use core_history::{normalize_play, PlayEvent, PlayEventRepository};
use provider_spotify::SpotifyApi;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecentIngestReport {
    /// Items returned by the API
    pub fetched: usize,
    /// Items that normalized into a play
    pub accepted: usize,
    pub inserted: u64,
    pub skipped: u64,
}

/// Pull the recent-play window and store it.
pub struct RecentIngestJob {
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn PlayEventRepository>,
    limit: usize,
}

impl RecentIngestJob {
    pub fn new(api: Arc<dyn SpotifyApi>, store: Arc<dyn PlayEventRepository>, limit: usize) -> Self {
        Self { api, store, limit }
    }

    #[instrument(skip(self), fields(limit = self.limit))]
    pub async fn run(&self) -> Result<RecentIngestReport> {
        let items = self.api.fetch_recent_plays(self.limit, None).await?;
        let events: Vec<PlayEvent> = items.iter().filter_map(normalize_play).collect();
        let outcome = self.store.save_events(&events).await?;

        let report = RecentIngestReport {
            fetched: items.len(),
            accepted: events.len(),
            inserted: outcome.inserted,
            skipped: outcome.skipped,
        };

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            skipped = report.skipped,
            "Stored recent plays"
        );
        Ok(report)
    }
}
