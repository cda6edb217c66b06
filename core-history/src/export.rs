//! Personal-data export rows
//!
//! The streaming-history export is a JSON array of flat rows. Music rows are
//! reshaped into [`PlayEvent`]s; podcast rows are dropped.

use crate::models::{AlbumSnapshot, PlayEvent, TrackSnapshot};
use crate::normalize::parse_played_at_utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Context attached to every imported play.
pub const EXPORT_SOURCE: &str = "history_dump";

/// One row of the export. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRow {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub ms_played: Option<u64>,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_album_name: Option<String>,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
    #[serde(default)]
    pub episode_name: Option<String>,
    #[serde(default)]
    pub spotify_episode_uri: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ExportRow {
    /// Podcast episodes share the export with music.
    pub fn is_episode(&self) -> bool {
        present(&self.spotify_episode_uri).is_some()
            || present(&self.episode_name).is_some()
            || present(&self.spotify_track_uri).is_some_and(|uri| uri.starts_with("spotify:episode"))
    }
}

/// Normalize one export row, or `None` for podcasts and rows without a
/// usable timestamp.
///
/// Music rows with null metadata are kept: they still occupy their
/// timestamp and count as listening time.
pub fn normalize_export_row(row: &ExportRow) -> Option<PlayEvent> {
    if row.is_episode() {
        return None;
    }

    let raw = present(&row.ts)?;
    let Some(played_at) = parse_played_at_utc(raw) else {
        debug!(ts = raw, "Skipping export row with unparseable timestamp");
        return None;
    };

    let track = TrackSnapshot {
        id: present(&row.spotify_track_uri)
            .and_then(|uri| uri.rsplit(':').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        name: present(&row.master_metadata_track_name).map(str::to_string),
        duration_ms: row.ms_played.unwrap_or(0),
        artists: present(&row.master_metadata_album_artist_name)
            .map(|artist| vec![artist.to_string()])
            .unwrap_or_default(),
        album: AlbumSnapshot {
            id: None,
            name: present(&row.master_metadata_album_album_name).map(str::to_string),
            images: Vec::new(),
        },
        ..Default::default()
    };
    Some(PlayEvent::new(played_at, track).with_context(json!({ "source": EXPORT_SOURCE })))
}
