//! # Listening Analytics
//!
//! Pure transforms from tracks, artists and plays into ranked summaries.
//! Nothing here performs I/O.
//!
//! - [`summary`]: top lists, genres, recent plays, listening profile, monthly buckets
//! - [`features`]: audio characteristic averages and highlights
//! - [`history`]: period summaries over stored plays
//! - [`payload`]: the composite wrapped report
//!
//! Every ranking that counts occurrences goes through [`Tally`], which
//! breaks ties by first appearance.

pub mod features;
pub mod history;
pub mod payload;
pub mod summary;
pub mod tally;

pub use features::{
    average_features, highlights, pick_features, AudioFeature, FeatureMap, FeatureValues,
    Highlight, Highlights,
};
pub use history::{summarize_month_from_plays, PeriodSummary, RankedEntry, DEFAULT_PERIOD_LIMIT};
pub use payload::{build_wrapped_payload, OverallStats, UserSummary, WrappedInputs, WrappedPayload};
pub use summary::{
    listening_profile, monthly_breakdown, pick_image_url, summarize_recent, summarize_top_artists,
    summarize_top_tracks, top_genres, ArtistCount, BucketTrack, GenreCount, ListeningProfile,
    MonthBucket, RecentEntry, RecentSummary, TopArtistEntry, TopTrackEntry,
};
pub use tally::Tally;

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
