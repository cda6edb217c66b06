//! # Wrapped Reports
//!
//! Assembles the report documents a host exposes: live views over the
//! API's top lists and recent plays, the composite wrapped payload, and
//! month or year reports over the stored play history.

use crate::error::Result;
use crate::period::{resolve_month_year, resolve_year, validate_limit, PeriodWindow};
use bridge_traits::time::Clock;
use core_analytics::{
    build_wrapped_payload, summarize_month_from_plays, summarize_recent, summarize_top_artists,
    summarize_top_tracks, FeatureMap, PeriodSummary, RecentSummary, TopArtistEntry, TopTrackEntry,
    WrappedInputs, WrappedPayload,
};
use core_history::PlayEventRepository;
use provider_spotify::{PlayHistoryItem, SpotifyApi, TimeRange, Track, UserProfile};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_TOP_LIMIT: usize = 50;
pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub use core_analytics::DEFAULT_PERIOD_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: String,
    pub display_name: Option<String>,
}

impl From<&UserProfile> for UserRef {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
        }
    }
}

/// Top lists for one time range, plus recent plays for the short range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermReport {
    pub time_range: TimeRange,
    pub user: UserRef,
    pub top_tracks: Vec<TopTrackEntry>,
    pub top_artists: Vec<TopArtistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<RecentSummary>,
}

/// Stored-history report for a month or a year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub start: String,
    pub end: String,
    #[serde(flatten)]
    pub summary: PeriodSummary,
}

impl PeriodReport {
    fn new(window: PeriodWindow, summary: PeriodSummary) -> Self {
        Self {
            year: window.year,
            month: window.month,
            start: window.start_iso(),
            end: window.end_iso(),
            summary,
        }
    }
}

/// Report assembly over the upstream API and the play store.
#[derive(Clone)]
pub struct WrappedService {
    api: Arc<dyn SpotifyApi>,
    store: Arc<dyn PlayEventRepository>,
    clock: Arc<dyn Clock>,
}

impl WrappedService {
    pub fn new(
        api: Arc<dyn SpotifyApi>,
        store: Arc<dyn PlayEventRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { api, store, clock }
    }

    /// Roughly the last four weeks, with the recent-play sample.
    #[instrument(skip(self))]
    pub async fn short_term(&self, top_limit: usize, recent_limit: usize) -> Result<TermReport> {
        let recent_limit = validate_limit("recent_limit", recent_limit)?;
        let mut report = self.term_report(TimeRange::Short, top_limit).await?;

        let recent = self.api.fetch_recent_plays(recent_limit, None).await?;
        report.recent = Some(summarize_recent(&recent));
        Ok(report)
    }

    /// Roughly the last six months.
    #[instrument(skip(self))]
    pub async fn medium_term(&self, top_limit: usize) -> Result<TermReport> {
        self.term_report(TimeRange::Medium, top_limit).await
    }

    /// Several years.
    #[instrument(skip(self))]
    pub async fn long_term(&self, top_limit: usize) -> Result<TermReport> {
        self.term_report(TimeRange::Long, top_limit).await
    }

    async fn term_report(&self, range: TimeRange, top_limit: usize) -> Result<TermReport> {
        let top_limit = validate_limit("top_limit", top_limit)?;

        let profile = self.api.fetch_profile().await?;
        let tracks = self.api.fetch_top_tracks(range, top_limit).await?;
        let artists = self.api.fetch_top_artists(range, top_limit).await?;

        Ok(TermReport {
            time_range: range,
            user: UserRef::from(&profile),
            top_tracks: summarize_top_tracks(&tracks, &FeatureMap::new()),
            top_artists: summarize_top_artists(&artists),
            recent: None,
        })
    }

    /// Composite report with genres, audio characteristics and monthly buckets.
    #[instrument(skip(self), fields(range = %time_range))]
    pub async fn wrapped(
        &self,
        time_range: TimeRange,
        top_limit: usize,
        recent_limit: usize,
    ) -> Result<WrappedPayload> {
        let top_limit = validate_limit("top_limit", top_limit)?;
        let recent_limit = validate_limit("recent_limit", recent_limit)?;

        let profile = self.api.fetch_profile().await?;
        let tracks = self.api.fetch_top_tracks(time_range, top_limit).await?;
        let artists = self.api.fetch_top_artists(time_range, top_limit).await?;
        let recent = self.api.fetch_recent_plays(recent_limit, None).await?;

        let ids = feature_ids(&tracks, &recent);
        let features = self.api.fetch_audio_features(&ids).await?;

        Ok(build_wrapped_payload(WrappedInputs {
            profile: &profile,
            top_tracks: &tracks,
            top_artists: &artists,
            recent: &recent,
            features: &features,
            time_range,
        }))
    }

    /// Stored plays of one calendar month, by default the previous one.
    #[instrument(skip(self))]
    pub async fn monthly(
        &self,
        year: Option<i32>,
        month: Option<u32>,
        limit: usize,
    ) -> Result<PeriodReport> {
        let limit = validate_limit("limit", limit)?;
        let (year, month) = resolve_month_year(year, month, self.clock.now())?;
        self.period_report(PeriodWindow::month(year, month)?, limit)
            .await
    }

    /// Stored plays of one calendar year, by default the previous one.
    #[instrument(skip(self))]
    pub async fn yearly(&self, year: Option<i32>, limit: usize) -> Result<PeriodReport> {
        let limit = validate_limit("limit", limit)?;
        let year = resolve_year(year, self.clock.now())?;
        self.period_report(PeriodWindow::year(year)?, limit).await
    }

    async fn period_report(&self, window: PeriodWindow, limit: usize) -> Result<PeriodReport> {
        let plays = self.store.fetch_range(window.start, window.end).await?;
        let summary = summarize_month_from_plays(&plays, limit);

        info!(
            year = window.year,
            month = ?window.month,
            plays = summary.play_count,
            "Built period report"
        );
        Ok(PeriodReport::new(window, summary))
    }
}

/// Track ids of the top list followed by those of the recent plays.
fn feature_ids(tracks: &[Track], recent: &[PlayHistoryItem]) -> Vec<String> {
    tracks
        .iter()
        .chain(recent.iter().filter_map(|item| item.track.as_ref()))
        .filter_map(|track| track.id.clone())
        .collect()
}
