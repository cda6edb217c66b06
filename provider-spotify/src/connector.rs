//! Spotify Web API connector implementation
//!
//! Implements [`SpotifyApi`] over the host-provided `HttpClient`.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use chrono::DateTime;
use core_auth::TokenManager;
use core_runtime::WrappedConfig;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{Result, SpotifyError};
use crate::types::{
    Artist, AudioFeatures, AudioFeaturesResponse, PlayHistoryItem, Paging, TimeRange, Track,
    TracksResponse, UserProfile,
};

/// Maximum items per page for top items and recent plays
pub const MAX_PAGE_SIZE: usize = 50;

/// Maximum ids per `/audio-features` request
pub const AUDIO_FEATURES_BATCH: usize = 100;

/// Maximum ids per `/tracks` request
pub const TRACK_DETAILS_BATCH: usize = 50;

/// Read access to the listening data of the authenticated user.
///
/// Every method performs its own pagination or batching. Errors are returned
/// as-is: no method retries anything except one `401` renewal.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// `GET /me`
    async fn fetch_profile(&self) -> Result<UserProfile>;

    /// Up to `max_items` top tracks for `range`, in the API's ranking order.
    async fn fetch_top_tracks(&self, range: TimeRange, max_items: usize) -> Result<Vec<Track>>;

    /// Up to `max_items` top artists for `range`, in the API's ranking order.
    async fn fetch_top_artists(&self, range: TimeRange, max_items: usize) -> Result<Vec<Artist>>;

    /// Up to `max_items` recent plays, newest first, older than `before_ms` when given.
    async fn fetch_recent_plays(
        &self,
        max_items: usize,
        before_ms: Option<i64>,
    ) -> Result<Vec<PlayHistoryItem>>;

    /// Audio characteristics keyed by track id. Tracks without data are absent.
    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<HashMap<String, AudioFeatures>>;

    /// Full track objects keyed by track id. Unknown ids are absent.
    async fn fetch_track_details(&self, track_ids: &[String]) -> Result<HashMap<String, Track>>;
}

/// Spotify Web API connector
///
/// # Example
///
/// ```ignore
/// use provider_spotify::{SpotifyApi, SpotifyConnector, TimeRange};
///
/// let connector = SpotifyConnector::new(http_client, tokens, "https://api.spotify.com/v1");
/// let tracks = connector.fetch_top_tracks(TimeRange::Short, 50).await?;
/// ```
pub struct SpotifyConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of bearer tokens
    tokens: Arc<TokenManager>,

    /// Base URL without trailing slash
    api_base: String,

    /// Per-request timeout, when set
    timeout: Option<Duration>,
}

impl SpotifyConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            http_client,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Connector using the configured API base and request timeout.
    pub fn from_config(
        config: &WrappedConfig,
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self::new(http_client, tokens, config.api_base.clone()).with_timeout(config.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let mut url = Url::parse(&format!("{}{}", self.api_base, path))
            .map_err(|e| SpotifyError::InvalidRequest(format!("Invalid URL for {}: {}", path, e)))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.into())
    }

    async fn send(&self, url: &str, token: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(url)
            .bearer_token(token)
            .accept_json()
            .maybe_timeout(self.timeout);

        Ok(self.http_client.execute(request).await?)
    }

    /// GET a JSON document, renewing the token once on `401`.
    #[instrument(skip(self, query), fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.build_url(path, query)?;

        let token = self.tokens.access_token().await?;
        let mut response = self.send(&url, &token).await?;

        if response.is_unauthorized() {
            warn!("Access token rejected, refreshing and retrying once");
            let token = self.tokens.force_refresh().await?;
            response = self.send(&url, &token).await?;
        }

        if !response.is_success() {
            let status = response.status;
            let message = response.error_message();
            warn!(status, error = %message, "API request failed");
            return Err(SpotifyError::ApiError {
                status_code: status,
                message,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            SpotifyError::ParseError(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    /// Offset pagination until `max_items` is reached or a short page arrives.
    async fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        max_items: usize,
    ) -> Result<Vec<T>> {
        let mut results: Vec<T> = Vec::new();
        let mut offset = 0usize;

        while results.len() < max_items {
            let limit = MAX_PAGE_SIZE.min(max_items - results.len());
            let mut query = params.to_vec();
            query.push(("limit", limit.to_string()));
            query.push(("offset", offset.to_string()));

            let page: Paging<T> = self.get_json(path, &query).await?;
            let count = page.items.len();
            results.extend(page.items);

            debug!(offset, limit, count, "Fetched page");

            if count < limit {
                break;
            }
            offset += limit;
        }

        // A misbehaving upstream may return more than asked for
        results.truncate(max_items);
        Ok(results)
    }
}

/// Distinct, non-empty ids in first-seen order.
fn distinct_ids(track_ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    track_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .collect()
}

/// Milliseconds since the epoch for an RFC 3339 `played_at`.
pub(crate) fn played_at_to_ms(played_at: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(played_at)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| SpotifyError::ParseError(format!("Invalid played_at '{}': {}", played_at, e)))
}

#[async_trait]
impl SpotifyApi for SpotifyConnector {
    #[instrument(skip(self))]
    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.get_json("/me", &[]).await
    }

    #[instrument(skip(self), fields(range = %range))]
    async fn fetch_top_tracks(&self, range: TimeRange, max_items: usize) -> Result<Vec<Track>> {
        let tracks: Vec<Track> = self
            .paginate(
                "/me/top/tracks",
                &[("time_range", range.as_str().to_string())],
                max_items,
            )
            .await?;
        info!(count = tracks.len(), "Fetched top tracks");
        Ok(tracks)
    }

    #[instrument(skip(self), fields(range = %range))]
    async fn fetch_top_artists(&self, range: TimeRange, max_items: usize) -> Result<Vec<Artist>> {
        let artists: Vec<Artist> = self
            .paginate(
                "/me/top/artists",
                &[("time_range", range.as_str().to_string())],
                max_items,
            )
            .await?;
        info!(count = artists.len(), "Fetched top artists");
        Ok(artists)
    }

    #[instrument(skip(self))]
    async fn fetch_recent_plays(
        &self,
        max_items: usize,
        before_ms: Option<i64>,
    ) -> Result<Vec<PlayHistoryItem>> {
        let mut collected: Vec<PlayHistoryItem> = Vec::new();
        let mut before = before_ms;

        while collected.len() < max_items {
            let mut query = vec![("limit", MAX_PAGE_SIZE.to_string())];
            if let Some(cursor) = before {
                query.push(("before", cursor.to_string()));
            }

            let page: Paging<PlayHistoryItem> =
                self.get_json("/me/player/recently-played", &query).await?;
            let count = page.items.len();
            if count == 0 {
                break;
            }

            let oldest = page.items.last().and_then(|item| item.played_at.clone());
            collected.extend(page.items);

            if count < MAX_PAGE_SIZE {
                break;
            }

            let oldest = oldest.ok_or_else(|| {
                SpotifyError::ParseError("Recent play page ends without played_at".to_string())
            })?;
            before = Some(played_at_to_ms(&oldest)? - 1);
            debug!(count, before = ?before, "Fetched recent plays page");
        }

        collected.truncate(max_items);
        info!(count = collected.len(), "Fetched recent plays");
        Ok(collected)
    }

    #[instrument(skip(self, track_ids), fields(requested = track_ids.len()))]
    async fn fetch_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<HashMap<String, AudioFeatures>> {
        let mut features = HashMap::new();

        for batch in distinct_ids(track_ids).chunks(AUDIO_FEATURES_BATCH) {
            let response: AudioFeaturesResponse = self
                .get_json("/audio-features", &[("ids", batch.join(","))])
                .await?;

            for item in response.audio_features.into_iter().flatten() {
                if let Some(id) = item.id.clone().filter(|id| !id.is_empty()) {
                    features.insert(id, item);
                }
            }
        }

        debug!(found = features.len(), "Fetched audio features");
        Ok(features)
    }

    #[instrument(skip(self, track_ids), fields(requested = track_ids.len()))]
    async fn fetch_track_details(&self, track_ids: &[String]) -> Result<HashMap<String, Track>> {
        let mut details = HashMap::new();

        for batch in distinct_ids(track_ids).chunks(TRACK_DETAILS_BATCH) {
            let response: TracksResponse = self
                .get_json("/tracks", &[("ids", batch.join(","))])
                .await?;

            for track in response.tracks.into_iter().flatten() {
                if let Some(id) = track.id.clone().filter(|id| !id.is_empty()) {
                    details.insert(id, track);
                }
            }
        }

        debug!(found = details.len(), "Fetched track details");
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_played_at_to_ms() {
        assert_eq!(
            played_at_to_ms("2024-03-01T10:00:00.123Z").unwrap(),
            1_709_287_200_123
        );
        assert_eq!(
            played_at_to_ms("2024-03-01T11:00:00+01:00").unwrap(),
            1_709_287_200_000
        );
        assert!(played_at_to_ms("yesterday").is_err());
    }

    #[test]
    fn test_distinct_ids_keeps_first_seen_order() {
        let ids = vec![
            "b".to_string(),
            "a".to_string(),
            String::new(),
            "b".to_string(),
            "c".to_string(),
        ];
        assert_eq!(distinct_ids(&ids), vec!["b", "a", "c"]);
    }
}
