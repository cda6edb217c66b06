#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_history::{create_test_pool, PlayEvent, PlayEventRepository, SqlitePlayEventRepository, TrackSnapshot};
use mockall::mock;
use provider_spotify::{
    Artist, AudioFeatures, PlayHistoryItem, Result as SpotifyResult, SpotifyApi, TimeRange, Track,
    UserProfile,
};
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    pub Spotify {}

    #[async_trait]
    impl SpotifyApi for Spotify {
        async fn fetch_profile(&self) -> SpotifyResult<UserProfile>;
        async fn fetch_top_tracks(&self, range: TimeRange, max_items: usize) -> SpotifyResult<Vec<Track>>;
        async fn fetch_top_artists(&self, range: TimeRange, max_items: usize) -> SpotifyResult<Vec<Artist>>;
        async fn fetch_recent_plays(
            &self,
            max_items: usize,
            before_ms: Option<i64>,
        ) -> SpotifyResult<Vec<PlayHistoryItem>>;
        async fn fetch_audio_features(
            &self,
            track_ids: &[String],
        ) -> SpotifyResult<HashMap<String, AudioFeatures>>;
        async fn fetch_track_details(&self, track_ids: &[String]) -> SpotifyResult<HashMap<String, Track>>;
    }
}

pub async fn store() -> Arc<dyn PlayEventRepository> {
    Arc::new(SqlitePlayEventRepository::new(create_test_pool().await.unwrap()))
}

pub fn recent_item(id: &str, played_at: &str, duration_ms: u64) -> PlayHistoryItem {
    serde_json::from_value(serde_json::json!({
        "played_at": played_at,
        "track": {
            "id": id,
            "name": format!("Track {id}"),
            "duration_ms": duration_ms,
            "artists": [{"id": "artist", "name": "Artist"}],
            "album": {"id": format!("album-{id}"), "name": "Album", "images": []}
        }
    }))
    .unwrap()
}

pub fn stored_play(played_at: DateTime<Utc>, id: &str, duration_ms: u64) -> PlayEvent {
    PlayEvent::new(
        played_at,
        TrackSnapshot {
            id: Some(id.to_string()),
            name: Some(format!("Track {id}")),
            duration_ms,
            artists: vec!["Artist".to_string()],
            ..Default::default()
        },
    )
}

pub fn profile() -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": "listener", "display_name": "Listener", "country": "SE", "followers": {"total": 7}
    }))
    .unwrap()
}
