//! Composite "wrapped" report

use crate::features::{average_features, highlights, FeatureMap, FeatureValues, Highlights};
use crate::summary::{
    listening_profile, monthly_breakdown, summarize_top_artists, summarize_top_tracks, top_genres,
    GenreCount, MonthBucket, TopArtistEntry, TopTrackEntry, DEFAULT_GENRE_LIMIT,
};
use provider_spotify::{Artist, PlayHistoryItem, TimeRange, Track, UserProfile};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub display_name: Option<String>,
    pub country: Option<String>,
    pub followers: Option<u64>,
}

impl From<&UserProfile> for UserSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            country: profile.country.clone(),
            followers: profile.followers.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    /// Minutes over the recent-play sample
    pub total_minutes: f64,
    pub unique_tracks: usize,
    pub unique_artists: usize,
    pub genres: Vec<GenreCount>,
    pub hourly_distribution: BTreeMap<u32, u64>,
    pub average_audio_features: FeatureValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrappedPayload {
    pub user: UserSummary,
    pub time_range: TimeRange,
    pub overall: OverallStats,
    pub top_tracks: Vec<TopTrackEntry>,
    pub top_artists: Vec<TopArtistEntry>,
    pub audio_feature_highlights: Highlights,
    pub monthly: Vec<MonthBucket>,
}

/// Inputs of [`build_wrapped_payload`].
#[derive(Debug, Clone, Copy)]
pub struct WrappedInputs<'a> {
    pub profile: &'a UserProfile,
    pub top_tracks: &'a [Track],
    pub top_artists: &'a [Artist],
    pub recent: &'a [PlayHistoryItem],
    pub features: &'a FeatureMap,
    pub time_range: TimeRange,
}

/// Assemble the full report from already fetched data.
pub fn build_wrapped_payload(inputs: WrappedInputs<'_>) -> WrappedPayload {
    let profile = listening_profile(inputs.recent);

    let unique_tracks = inputs
        .top_tracks
        .iter()
        .map(|track| track.id.as_deref())
        .collect::<HashSet<_>>()
        .len();
    let unique_artists = inputs
        .top_artists
        .iter()
        .map(|artist| artist.id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let payload = WrappedPayload {
        user: UserSummary::from(inputs.profile),
        time_range: inputs.time_range,
        overall: OverallStats {
            total_minutes: profile.total_minutes,
            unique_tracks,
            unique_artists,
            genres: top_genres(inputs.top_artists, DEFAULT_GENRE_LIMIT),
            hourly_distribution: profile.hourly_distribution,
            average_audio_features: average_features(inputs.top_tracks, inputs.features),
        },
        top_tracks: summarize_top_tracks(inputs.top_tracks, inputs.features),
        top_artists: summarize_top_artists(inputs.top_artists),
        audio_feature_highlights: highlights(inputs.top_tracks, inputs.features),
        monthly: monthly_breakdown(inputs.recent, inputs.features),
    };

    debug!(
        time_range = %inputs.time_range,
        top_tracks = payload.top_tracks.len(),
        months = payload.monthly.len(),
        "Built wrapped payload"
    );
    payload
}
