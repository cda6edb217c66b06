//! # Play History Store
//!
//! Persistent, idempotent store of normalized play events.
//!
//! ## Overview
//!
//! Every play is stored once, keyed by its UTC timestamp rendered as a
//! canonical RFC 3339 string. Re-submitting a play is a no-op, which makes
//! ingestion safe to repeat and safe to run from several jobs at once.
//!
//! ## Components
//!
//! - [`db`]: SQLite pool creation, migrations and health check
//! - [`models`]: [`PlayEvent`] and the embedded track snapshot
//! - [`normalize`]: API play items to events, timestamp parsing
//! - [`export`]: personal-data export rows to events
//! - [`repositories`]: the [`PlayEventRepository`] trait and its SQLite implementation

pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod normalize;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{HistoryError, Result};
pub use export::{normalize_export_row, ExportRow};
pub use models::{canonical_key, AlbumSnapshot, PlayEvent, TrackSnapshot};
pub use normalize::{normalize_play, parse_played_at, parse_played_at_utc, snapshot_track};
pub use repositories::{PlayEventRepository, SaveOutcome, SqlitePlayEventRepository};
