//! Summaries of stored play history

use crate::round_to;
use crate::summary::pick_image_url;
use crate::tally::Tally;
use chrono::NaiveDate;
use core_history::PlayEvent;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Default size of each ranked list in a period summary.
pub const DEFAULT_PERIOD_LIMIT: usize = 20;

/// Ranked track, artist or album with its play count and minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub id: String,
    pub name: Option<String>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub image_url: Option<String>,
    pub play_count: u64,
    pub minutes: f64,
}

/// Totals and ranked lists over a set of stored plays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub play_count: u64,
    pub unique_tracks: usize,
    pub unique_artists: usize,
    pub unique_albums: usize,
    pub total_minutes: f64,
    pub days_active: usize,
    pub top_tracks: Vec<RankedEntry>,
    pub top_artists: Vec<RankedEntry>,
    pub top_albums: Vec<RankedEntry>,
}

#[derive(Default, Clone)]
struct EntryMeta {
    name: Option<String>,
    artists: Vec<String>,
    album: Option<String>,
    image_url: Option<String>,
}

#[derive(Default)]
struct Ranking {
    plays: Tally<String>,
    durations: HashMap<String, u64>,
    meta: HashMap<String, EntryMeta>,
}

impl Ranking {
    fn record(&mut self, key: &str, duration_ms: u64, meta: EntryMeta) {
        self.plays.add(key.to_string());
        *self.durations.entry(key.to_string()).or_insert(0) += duration_ms;
        // latest snapshot wins
        self.meta.insert(key.to_string(), meta);
    }

    fn ranked(&self, limit: usize) -> Vec<RankedEntry> {
        self.plays
            .most_common(limit)
            .into_iter()
            .enumerate()
            .map(|(idx, (key, play_count))| {
                let meta = self.meta.get(&key).cloned().unwrap_or_default();
                let duration = self.durations.get(&key).copied().unwrap_or(0);
                RankedEntry {
                    rank: idx + 1,
                    name: meta.name,
                    artists: meta.artists,
                    album: meta.album,
                    image_url: meta.image_url,
                    play_count,
                    minutes: round_to(duration as f64 / 60_000.0, 2),
                    id: key,
                }
            })
            .collect()
    }
}

/// Collapse stored plays into totals and top tracks, artists and albums.
///
/// - Tracks are keyed by id, else by name. Plays with neither are not counted.
/// - Albums are keyed by album id, else album name, else the track key.
/// - Every credited artist gets the play.
/// - Active days are UTC calendar dates of every play in the input.
pub fn summarize_month_from_plays(plays: &[PlayEvent], limit: usize) -> PeriodSummary {
    if plays.is_empty() {
        return PeriodSummary::default();
    }

    let mut tracks = Ranking::default();
    let mut albums = Ranking::default();
    let mut artists = Ranking::default();
    let mut days: HashSet<NaiveDate> = HashSet::new();
    let mut total_ms = 0u64;

    for play in plays {
        days.insert(play.played_at.date_naive());

        let track = &play.track;
        let Some(track_key) = track.identity() else {
            continue;
        };

        let duration = track.duration_ms;
        total_ms += duration;

        let album = &track.album;
        let album_key = album
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| album.name.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or(track_key);
        let image_url = pick_image_url(&album.images);

        tracks.record(
            track_key,
            duration,
            EntryMeta {
                name: track.name.clone(),
                artists: track.artists.clone(),
                album: album.name.clone(),
                image_url: image_url.clone(),
            },
        );
        albums.record(
            album_key,
            duration,
            EntryMeta {
                name: album.name.clone(),
                artists: track.artists.clone(),
                album: None,
                image_url,
            },
        );
        for artist in &track.artists {
            artists.record(
                artist,
                duration,
                EntryMeta {
                    name: Some(artist.clone()),
                    ..Default::default()
                },
            );
        }
    }

    PeriodSummary {
        play_count: tracks.plays.total(),
        unique_tracks: tracks.plays.len(),
        unique_artists: artists.plays.len(),
        unique_albums: albums.plays.len(),
        total_minutes: round_to(total_ms as f64 / 60_000.0, 2),
        days_active: days.len(),
        top_tracks: tracks.ranked(limit),
        top_artists: artists.ranked(limit),
        top_albums: albums.ranked(limit),
    }
}
