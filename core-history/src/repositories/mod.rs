//! # Repositories
//!
//! - [`PlayEventRepository`]: idempotent play storage, range scans and
//!   artwork backfill
//! - [`SqlitePlayEventRepository`]: the `sqlx` implementation

pub mod play_event;

pub use play_event::{PlayEventRepository, SaveOutcome, SqlitePlayEventRepository};
