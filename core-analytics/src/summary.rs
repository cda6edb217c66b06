//! Summaries of live API data: top lists, genres, recent plays and monthly buckets

use crate::features::{average_features, features_for, pick_features, FeatureMap, FeatureValues};
use crate::round_to;
use crate::tally::Tally;
use chrono::{Datelike, NaiveDate, Timelike};
use core_history::{parse_played_at, parse_played_at_utc};
use provider_spotify::{Artist, Image, PlayHistoryItem, Track};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Tracks kept per monthly bucket.
pub const BUCKET_TOP_TRACKS: usize = 5;

/// Artists kept per monthly bucket.
pub const BUCKET_TOP_ARTISTS: usize = 5;

/// Default number of genres in the composite payload.
pub const DEFAULT_GENRE_LIMIT: usize = 10;

/// Artwork for cards: the medium image when there are several.
pub fn pick_image_url(images: &[Image]) -> Option<String> {
    let url = match images {
        [] => return None,
        [only] => &only.url,
        [first, second, ..] => {
            if second.url.is_empty() {
                &first.url
            } else {
                &second.url
            }
        }
    };
    Some(url.clone()).filter(|url| !url.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTrackEntry {
    pub rank: usize,
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub image_url: Option<String>,
    pub popularity: Option<u32>,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    pub features: FeatureValues,
}

/// Rank tracks in the order given.
pub fn summarize_top_tracks(tracks: &[Track], features: &FeatureMap) -> Vec<TopTrackEntry> {
    tracks
        .iter()
        .enumerate()
        .map(|(idx, track)| TopTrackEntry {
            rank: idx + 1,
            id: track.id.clone(),
            name: track.name.clone(),
            artists: track.artist_names(),
            album: track.album.name.clone(),
            image_url: pick_image_url(&track.album.images),
            popularity: track.popularity,
            duration_ms: track.duration_ms,
            preview_url: track.preview_url.clone(),
            features: pick_features(features_for(track, features)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopArtistEntry {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub followers: Option<u64>,
    pub popularity: Option<u32>,
}

/// Rank artists in the order given.
pub fn summarize_top_artists(artists: &[Artist]) -> Vec<TopArtistEntry> {
    artists
        .iter()
        .enumerate()
        .map(|(idx, artist)| TopArtistEntry {
            rank: idx + 1,
            id: artist.id.clone(),
            name: artist.name.clone(),
            genres: artist.genres.clone(),
            followers: artist.followers.total,
            popularity: artist.popularity,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

/// Most frequent genre tags across `artists`.
pub fn top_genres(artists: &[Artist], limit: usize) -> Vec<GenreCount> {
    let tally: Tally<&str> = artists
        .iter()
        .flat_map(|artist| artist.genres.iter().map(String::as_str))
        .collect();

    tally
        .most_common(limit)
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre: genre.to_string(),
            count,
        })
        .collect()
}

/// Listening activity over a list of plays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListeningProfile {
    pub total_minutes: f64,
    /// Hour of day (0-23) to play count
    pub hourly_distribution: BTreeMap<u32, u64>,
    pub unique_days: usize,
}

/// Minutes, hour histogram and distinct dates.
///
/// Hours and dates are read in the offset the timestamp was reported in.
/// Plays without a parseable timestamp still count towards the minutes.
pub fn listening_profile(items: &[PlayHistoryItem]) -> ListeningProfile {
    let mut minutes = 0.0;
    let mut hourly = BTreeMap::new();
    let mut days: HashSet<NaiveDate> = HashSet::new();

    for item in items {
        if let Some(track) = &item.track {
            minutes += track.duration_ms as f64 / 60_000.0;
        }
        if let Some(played_at) = item.played_at.as_deref().and_then(parse_played_at) {
            *hourly.entry(played_at.hour()).or_insert(0) += 1;
            days.insert(played_at.date_naive());
        }
    }

    ListeningProfile {
        total_minutes: round_to(minutes, 2),
        hourly_distribution: hourly,
        unique_days: days.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEntry {
    pub played_at: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub artists: Vec<String>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecentSummary {
    pub count: usize,
    pub items: Vec<RecentEntry>,
}

/// Flat list of recent plays.
pub fn summarize_recent(items: &[PlayHistoryItem]) -> RecentSummary {
    let items: Vec<RecentEntry> = items
        .iter()
        .map(|item| {
            let track = item.track.as_ref();
            RecentEntry {
                played_at: item.played_at.clone(),
                id: track.and_then(|t| t.id.clone()),
                name: track.map(|t| t.name.clone()),
                artists: track.map(Track::artist_names).unwrap_or_default(),
                duration_ms: track.map(|t| t.duration_ms),
            }
        })
        .collect();

    RecentSummary {
        count: items.len(),
        items,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketTrack {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub image_url: Option<String>,
    pub features: FeatureValues,
}

/// One calendar month of plays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub month: String,
    pub total_minutes: f64,
    pub track_count: usize,
    pub top_artists: Vec<ArtistCount>,
    pub top_tracks: Vec<BucketTrack>,
    pub average_features: FeatureValues,
}

#[derive(Default)]
struct BucketAccumulator<'a> {
    tracks: Vec<&'a Track>,
    minutes: f64,
    artists: Tally<String>,
}

/// Group plays by UTC calendar month, most recent month first.
///
/// Plays without a track or a parseable timestamp are skipped.
pub fn monthly_breakdown(items: &[PlayHistoryItem], features: &FeatureMap) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<String, BucketAccumulator<'_>> = BTreeMap::new();

    for item in items {
        let (Some(track), Some(played_at)) = (
            item.track.as_ref(),
            item.played_at.as_deref().and_then(parse_played_at_utc),
        ) else {
            continue;
        };

        let key = format!("{:04}-{:02}", played_at.year(), played_at.month());
        let bucket = buckets.entry(key).or_default();
        bucket.tracks.push(track);
        bucket.minutes += track.duration_ms as f64 / 60_000.0;
        for name in track.artist_names() {
            bucket.artists.add(name);
        }
    }

    buckets
        .into_iter()
        .rev()
        .map(|(month, bucket)| {
            MonthBucket {
                month,
                total_minutes: round_to(bucket.minutes, 2),
                track_count: bucket.tracks.len(),
                top_artists: bucket
                    .artists
                    .most_common(BUCKET_TOP_ARTISTS)
                    .into_iter()
                    .map(|(name, count)| ArtistCount { name, count })
                    .collect(),
                top_tracks: bucket_top_tracks(&bucket.tracks, features),
                average_features: average_features(bucket.tracks.iter().copied(), features),
            }
        })
        .collect()
}

/// Distinct tracks in first-seen order.
fn bucket_top_tracks(tracks: &[&Track], features: &FeatureMap) -> Vec<BucketTrack> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .filter(|track| seen.insert(track.identity().map(str::to_string)))
        .take(BUCKET_TOP_TRACKS)
        .map(|track| BucketTrack {
            id: track.id.clone(),
            name: track.name.clone(),
            artists: track.artist_names(),
            image_url: pick_image_url(&track.album.images),
            features: pick_features(features_for(track, features)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_spotify::{AudioFeatures, Followers};

    fn image(url: &str) -> Image {
        Image {
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn artist(id: &str, genres: &[&str]) -> Artist {
        Artist {
            id: id.to_string(),
            name: id.to_uppercase(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            followers: Followers { total: Some(10) },
            popularity: Some(50),
        }
    }

    fn play(id: &str, played_at: &str, duration_ms: u64, artists: &[&str]) -> PlayHistoryItem {
        serde_json::from_value(serde_json::json!({
            "played_at": played_at,
            "track": {
                "id": id,
                "name": format!("Track {id}"),
                "duration_ms": duration_ms,
                "artists": artists.iter().map(|a| serde_json::json!({"name": a})).collect::<Vec<_>>(),
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_pick_image_url() {
        assert_eq!(pick_image_url(&[]), None);
        assert_eq!(pick_image_url(&[image("a")]), Some("a".to_string()));
        assert_eq!(
            pick_image_url(&[image("large"), image("medium"), image("small")]),
            Some("medium".to_string())
        );
        assert_eq!(
            pick_image_url(&[image("large"), image("")]),
            Some("large".to_string())
        );
    }

    #[test]
    fn test_top_genres_counts_and_ties() {
        let artists = vec![artist("a", &["pop", "rock"]), artist("b", &["pop"])];
        assert_eq!(
            top_genres(&artists, 10),
            vec![
                GenreCount { genre: "pop".to_string(), count: 2 },
                GenreCount { genre: "rock".to_string(), count: 1 },
            ]
        );

        let tied = vec![artist("a", &["indie", "folk"]), artist("b", &["folk", "indie"])];
        let genres: Vec<_> = top_genres(&tied, 1).into_iter().map(|g| g.genre).collect();
        assert_eq!(genres, vec!["indie"]);
    }

    #[test]
    fn test_summaries_keep_input_order() {
        let tracks = vec![
            Track {
                id: Some("z".to_string()),
                name: "Zed".to_string(),
                ..Default::default()
            },
            Track {
                id: Some("a".to_string()),
                name: "Aye".to_string(),
                album: provider_spotify::Album {
                    name: Some("Album".to_string()),
                    images: vec![image("l"), image("m")],
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        let features: FeatureMap = [(
            "a".to_string(),
            AudioFeatures {
                energy: Some(0.5),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        let summary = summarize_top_tracks(&tracks, &features);
        assert_eq!(summary[0].rank, 1);
        assert_eq!(summary[0].name, "Zed");
        assert!(summary[0].features.is_empty());
        assert_eq!(summary[1].rank, 2);
        assert_eq!(summary[1].image_url.as_deref(), Some("m"));
        assert_eq!(summary[1].album.as_deref(), Some("Album"));
        assert_eq!(summary[1].features.len(), 1);

        let artists = summarize_top_artists(&[artist("b", &[]), artist("a", &["x"])]);
        assert_eq!(artists[0].id, "b");
        assert_eq!(artists[1].rank, 2);
        assert_eq!(artists[1].followers, Some(10));
    }

    #[test]
    fn test_listening_profile() {
        let items = vec![
            play("a", "2024-03-01T10:15:00Z", 180_000, &["A"]),
            play("b", "2024-03-01T10:45:00Z", 200_000, &["A"]),
            play("c", "2024-03-02T23:30:00+02:00", 220_000, &["B"]),
        ];

        let profile = listening_profile(&items);
        assert_eq!(profile.total_minutes, 10.0);
        assert_eq!(profile.hourly_distribution.get(&10), Some(&2));
        assert_eq!(profile.hourly_distribution.get(&23), Some(&1));
        assert_eq!(profile.unique_days, 2);
    }

    #[test]
    fn test_listening_profile_empty() {
        let profile = listening_profile(&[]);
        assert_eq!(profile, ListeningProfile::default());
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            serde_json::json!({"total_minutes": 0.0, "hourly_distribution": {}, "unique_days": 0})
        );
    }

    #[test]
    fn test_summarize_recent() {
        let mut items = vec![play("a", "2024-03-01T10:15:00Z", 1000, &["A", "B"])];
        items.push(PlayHistoryItem::default());

        let recent = summarize_recent(&items);
        assert_eq!(recent.count, 2);
        assert_eq!(recent.items[0].artists, vec!["A", "B"]);
        assert_eq!(recent.items[0].duration_ms, Some(1000));
        assert!(recent.items[1].id.is_none());
    }

    #[test]
    fn test_monthly_breakdown() {
        let items = vec![
            play("a", "2024-03-31T23:30:00Z", 60_000, &["A"]),
            play("b", "2024-03-10T10:00:00Z", 120_000, &["B", "A"]),
            play("a", "2024-03-09T10:00:00Z", 60_000, &["A"]),
            // 2024-04-01T00:30 local, still March in UTC
            play("c", "2024-04-01T00:30:00+01:00", 60_000, &["C"]),
            play("d", "2024-02-01T00:00:00Z", 30_000, &["D"]),
            PlayHistoryItem::default(),
        ];

        let months = monthly_breakdown(&items, &FeatureMap::new());
        let keys: Vec<_> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-02"]);

        let march = &months[0];
        assert_eq!(march.track_count, 4);
        assert_eq!(march.total_minutes, 5.0);
        assert_eq!(
            march.top_artists[0],
            ArtistCount { name: "A".to_string(), count: 3 }
        );
        let ids: Vec<_> = march.top_tracks.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(march.average_features.is_empty());
    }

    #[test]
    fn test_bucket_top_tracks_capped() {
        let items: Vec<_> = (0..8)
            .map(|i| play(&format!("t{i}"), "2024-05-05T05:00:00Z", 1000, &["A"]))
            .collect();
        let months = monthly_breakdown(&items, &FeatureMap::new());
        assert_eq!(months[0].top_tracks.len(), BUCKET_TOP_TRACKS);
        assert_eq!(months[0].track_count, 8);
    }
}
