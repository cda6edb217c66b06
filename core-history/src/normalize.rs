//! Play normalization
//!
//! Turns recent-play items from the API into [`PlayEvent`]s. Items without a
//! usable track or timestamp are dropped, not reported as errors.

use crate::models::{AlbumSnapshot, PlayEvent, TrackSnapshot};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use provider_spotify::{PlayHistoryItem, Track};
use tracing::debug;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a play timestamp, keeping its offset.
///
/// Accepts RFC 3339 (`Z` or numeric offset). A timestamp without an offset
/// is taken to be UTC already.
pub fn parse_played_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// [`parse_played_at`] converted to UTC.
pub fn parse_played_at_utc(raw: &str) -> Option<DateTime<Utc>> {
    parse_played_at(raw).map(|parsed| parsed.with_timezone(&Utc))
}

/// Snapshot of an API track.
pub fn snapshot_track(track: &Track) -> TrackSnapshot {
    TrackSnapshot {
        id: track.id.clone(),
        name: Some(track.name.clone()).filter(|name| !name.is_empty()),
        duration_ms: track.duration_ms,
        artists: track.artist_names(),
        album: AlbumSnapshot {
            id: track.album.id.clone(),
            name: track.album.name.clone(),
            images: track.album.images.clone(),
        },
        popularity: track.popularity,
        explicit: Some(track.explicit),
        external_urls: Some(track.external_urls.clone()).filter(|urls| !urls.is_empty()),
    }
}

/// Normalize one recent-play item.
///
/// Returns `None` when the track is missing, or when `played_at` is missing
/// or unparseable. A track without id or name is still a play.
pub fn normalize_play(item: &PlayHistoryItem) -> Option<PlayEvent> {
    let track = item.track.as_ref()?;
    let raw = item.played_at.as_deref()?;

    let Some(played_at) = parse_played_at_utc(raw) else {
        debug!(played_at = raw, "Skipping play with unparseable timestamp");
        return None;
    };

    Some(PlayEvent {
        played_at,
        track: snapshot_track(track),
        context: item.context.clone().filter(|context| !context.is_null()),
    })
}
