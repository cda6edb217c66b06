//! Play event repository trait and implementation

use crate::error::Result;
use crate::models::{PlayEvent, PlayEventRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use provider_spotify::Image;
use serde::Serialize;
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, instrument};

/// Result of a batch save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// Events stored for the first time
    pub inserted: u64,
    /// Events whose key already existed, left untouched
    pub skipped: u64,
}

impl SaveOutcome {
    pub fn merge(&mut self, other: SaveOutcome) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
    }
}

/// Storage of play events keyed by their canonical timestamp.
#[async_trait]
pub trait PlayEventRepository: Send + Sync {
    /// Insert every event whose key is not stored yet.
    ///
    /// Existing events are never overwritten. Two events in the same batch
    /// with the same key count as one insert and one skip.
    ///
    /// # Returns
    /// Exact inserted and skipped counts
    async fn save_events(&self, events: &[PlayEvent]) -> Result<SaveOutcome>;

    /// Events with `start <= played_at < end`, oldest first.
    async fn fetch_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PlayEvent>>;

    /// Distinct track ids whose stored album has no images.
    ///
    /// # Arguments
    /// * `limit` - Maximum number of ids
    async fn find_track_ids_missing_artwork(&self, limit: usize) -> Result<Vec<String>>;

    /// Replace the album images of every stored play of `track_id`.
    ///
    /// # Returns
    /// Number of rows updated
    async fn patch_album_artwork(&self, track_id: &str, images: &[Image]) -> Result<u64>;

    /// Count stored events
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of PlayEventRepository
pub struct SqlitePlayEventRepository {
    pool: SqlitePool,
}

impl SqlitePlayEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn optional_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

#[async_trait]
impl PlayEventRepository for SqlitePlayEventRepository {
    #[instrument(skip(self, events), fields(batch = events.len()))]
    async fn save_events(&self, events: &[PlayEvent]) -> Result<SaveOutcome> {
        let mut outcome = SaveOutcome::default();
        if events.is_empty() {
            return Ok(outcome);
        }

        let mut tx = self.pool.begin().await?;

        for event in events {
            let track = &event.track;
            let result = query(
                r#"
                INSERT OR IGNORE INTO play_events (
                    id, played_at_us, track_id, track_name, duration_ms, artists,
                    album_id, album_name, album_images, popularity, explicit,
                    external_urls, context
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(event.key())
            .bind(event.played_at.timestamp_micros())
            .bind(&track.id)
            .bind(&track.name)
            .bind(i64::try_from(track.duration_ms).unwrap_or(i64::MAX))
            .bind(serde_json::to_string(&track.artists)?)
            .bind(&track.album.id)
            .bind(&track.album.name)
            .bind(serde_json::to_string(&track.album.images)?)
            .bind(track.popularity.map(i64::from))
            .bind(track.explicit)
            .bind(optional_json(track.external_urls.as_ref())?)
            .bind(optional_json(event.context.as_ref())?)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        tx.commit().await?;

        debug!(
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "Saved play events"
        );
        Ok(outcome)
    }

    #[instrument(skip(self), fields(start = %start, end = %end))]
    async fn fetch_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PlayEvent>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let rows = query_as::<_, PlayEventRow>(
            r#"
            SELECT id, track_id, track_name, duration_ms, artists, album_id, album_name,
                   album_images, popularity, explicit, external_urls, context
            FROM play_events
            WHERE played_at_us >= ? AND played_at_us < ?
            ORDER BY played_at_us ASC, id ASC
            "#,
        )
        .bind(start.timestamp_micros())
        .bind(end.timestamp_micros())
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .into_iter()
            .map(PlayEvent::try_from)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = events.len(), "Fetched play range");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn find_track_ids_missing_artwork(&self, limit: usize) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            r#"
            SELECT track_id
            FROM play_events
            WHERE track_id IS NOT NULL AND track_id != ''
              AND (album_images = '[]' OR album_images = '')
            GROUP BY track_id
            ORDER BY MIN(played_at_us) ASC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    #[instrument(skip(self, images), fields(images = images.len()))]
    async fn patch_album_artwork(&self, track_id: &str, images: &[Image]) -> Result<u64> {
        let result = query("UPDATE play_events SET album_images = ? WHERE track_id = ?")
            .bind(serde_json::to_string(images)?)
            .bind(track_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM play_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::TrackSnapshot;
    use chrono::TimeZone;

    async fn repo() -> SqlitePlayEventRepository {
        SqlitePlayEventRepository::new(create_test_pool().await.unwrap())
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn play(played_at: DateTime<Utc>, id: &str) -> PlayEvent {
        PlayEvent::new(
            played_at,
            TrackSnapshot {
                id: Some(id.to_string()),
                name: Some(format!("Track {id}")),
                duration_ms: 180_000,
                artists: vec!["Artist".to_string()],
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let repo = repo().await;
        let batch = vec![play(at(1, 10), "a"), play(at(1, 11), "b"), play(at(2, 9), "c")];

        let first = repo.save_events(&batch).await.unwrap();
        assert_eq!(first, SaveOutcome { inserted: 3, skipped: 0 });

        let second = repo.save_events(&batch).await.unwrap();
        assert_eq!(second, SaveOutcome { inserted: 0, skipped: 3 });

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_overlapping_batches() {
        let repo = repo().await;
        repo.save_events(&[play(at(1, 10), "a"), play(at(1, 11), "b")])
            .await
            .unwrap();

        let outcome = repo
            .save_events(&[play(at(1, 11), "b"), play(at(1, 12), "c")])
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome { inserted: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn test_same_timestamp_collapses_to_first_event() {
        // Plays are keyed by timestamp alone: a second track at the same
        // instant is treated as a duplicate and the stored row is kept.
        let repo = repo().await;
        let outcome = repo
            .save_events(&[play(at(1, 10), "first"), play(at(1, 10), "second")])
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome { inserted: 1, skipped: 1 });

        let outcome = repo.save_events(&[play(at(1, 10), "third")]).await.unwrap();
        assert_eq!(outcome.skipped, 1);

        let stored = repo.fetch_range(at(1, 0), at(2, 0)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].track.id.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_offsets_normalize_to_same_key() {
        let repo = repo().await;
        let utc = play(at(1, 10), "a");
        let shifted = crate::normalize::parse_played_at_utc("2024-03-01T11:00:00+01:00").unwrap();

        repo.save_events(&[utc]).await.unwrap();
        let outcome = repo.save_events(&[play(shifted, "a")]).await.unwrap();
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_fetch_range_is_half_open_and_ascending() {
        let repo = repo().await;
        repo.save_events(&[
            play(at(3, 0), "end"),
            play(at(2, 12), "middle"),
            play(at(1, 0), "start"),
            play(at(1, 0) - chrono::Duration::microseconds(1), "before"),
        ])
        .await
        .unwrap();

        let events = repo.fetch_range(at(1, 0), at(3, 0)).await.unwrap();
        let ids: Vec<_> = events.iter().filter_map(|e| e.track.id.as_deref()).collect();
        assert_eq!(ids, vec!["start", "middle"]);

        assert!(repo.fetch_range(at(3, 0), at(1, 0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_snapshot_round_trips() {
        let repo = repo().await;
        let mut event = play(at(1, 10), "a").with_context(serde_json::json!({"type": "album"}));
        event.track.album.images = vec![Image {
            url: "https://img/640".to_string(),
            height: Some(640),
            width: Some(640),
        }];
        event.track.popularity = Some(61);
        event.track.explicit = Some(true);

        repo.save_events(std::slice::from_ref(&event)).await.unwrap();
        let stored = repo.fetch_range(at(1, 0), at(2, 0)).await.unwrap();
        assert_eq!(stored, vec![event]);
    }

    #[tokio::test]
    async fn test_missing_artwork_and_patch() {
        let repo = repo().await;
        let mut with_art = play(at(1, 9), "art");
        with_art.track.album.images = vec![Image {
            url: "https://img/1".to_string(),
            ..Default::default()
        }];
        let mut no_id = play(at(1, 8), "x");
        no_id.track.id = None;

        repo.save_events(&[
            play(at(1, 10), "bare"),
            play(at(1, 11), "bare"),
            play(at(1, 12), "other"),
            with_art,
            no_id,
        ])
        .await
        .unwrap();

        let missing = repo.find_track_ids_missing_artwork(10).await.unwrap();
        assert_eq!(missing, vec!["bare", "other"]);
        assert_eq!(repo.find_track_ids_missing_artwork(1).await.unwrap(), vec!["bare"]);

        let images = vec![Image {
            url: "https://img/bare".to_string(),
            ..Default::default()
        }];
        assert_eq!(repo.patch_album_artwork("bare", &images).await.unwrap(), 2);

        assert_eq!(
            repo.find_track_ids_missing_artwork(10).await.unwrap(),
            vec!["other"]
        );
        let patched = repo.fetch_range(at(1, 10), at(1, 11)).await.unwrap();
        assert_eq!(patched[0].track.album.images, images);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let repo = repo().await;
        assert_eq!(repo.save_events(&[]).await.unwrap(), SaveOutcome::default());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
