//! Stored play event model
//!
//! A [`PlayEvent`] is the persisted unit: a UTC timestamp, a snapshot of the
//! track as it was when the play was recorded, and an optional context
//! value describing where the play came from.

use crate::error::{HistoryError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use provider_spotify::Image;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical store key for a play timestamp.
///
/// RFC 3339 in UTC with microsecond precision, e.g.
/// `2024-03-01T10:00:00.000000+00:00`. Two plays with the same key are the
/// same stored event.
pub fn canonical_key(played_at: &DateTime<Utc>) -> String {
    played_at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Album as embedded in a stored play.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSnapshot {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Largest first, as delivered by the API
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Track metadata captured at ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: AlbumSnapshot,
    pub popularity: Option<u32>,
    pub explicit: Option<bool>,
    pub external_urls: Option<BTreeMap<String, String>>,
}

impl TrackSnapshot {
    /// Counting identity: the id, else the name.
    pub fn identity(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.name.as_deref().filter(|name| !name.is_empty()))
    }
}

/// One stored play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub played_at: DateTime<Utc>,
    pub track: TrackSnapshot,
    pub context: Option<Value>,
}

impl PlayEvent {
    pub fn new(played_at: DateTime<Utc>, track: TrackSnapshot) -> Self {
        Self {
            played_at,
            track,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Store key of this event.
    pub fn key(&self) -> String {
        canonical_key(&self.played_at)
    }
}

/// Row shape of the `play_events` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PlayEventRow {
    pub id: String,
    pub track_id: Option<String>,
    pub track_name: Option<String>,
    pub duration_ms: i64,
    pub artists: String,
    pub album_id: Option<String>,
    pub album_name: Option<String>,
    pub album_images: String,
    pub popularity: Option<i64>,
    pub explicit: Option<bool>,
    pub external_urls: Option<String>,
    pub context: Option<String>,
}

impl TryFrom<PlayEventRow> for PlayEvent {
    type Error = HistoryError;

    fn try_from(row: PlayEventRow) -> Result<Self> {
        let played_at = DateTime::parse_from_rfc3339(&row.id)
            .map_err(|e| HistoryError::InvalidTimestamp(format!("{}: {}", row.id, e)))?
            .with_timezone(&Utc);

        let external_urls = row
            .external_urls
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let context = row.context.as_deref().map(serde_json::from_str).transpose()?;

        Ok(PlayEvent {
            played_at,
            track: TrackSnapshot {
                id: row.track_id,
                name: row.track_name,
                duration_ms: u64::try_from(row.duration_ms).unwrap_or(0),
                artists: serde_json::from_str(&row.artists)?,
                album: AlbumSnapshot {
                    id: row.album_id,
                    name: row.album_name,
                    images: serde_json::from_str(&row.album_images)?,
                },
                popularity: row.popularity.and_then(|p| u32::try_from(p).ok()),
                explicit: row.explicit,
                external_urls,
            },
            context,
        })
    }
}
