//! # Ingestion Jobs
//!
//! One-shot orchestrators that move plays into the history store.
//!
//! - [`RecentIngestJob`]: recent plays from the API
//! - [`ExportImportJob`]: personal-data export files
//! - [`ArtworkBackfillJob`]: album artwork for stored plays that lack it
//!
//! Every job runs strictly sequentially and can be re-run at any time: the
//! store ignores plays it already has.

mod backfill;
mod import;
mod recent;

pub use backfill::{ArtworkBackfillJob, BackfillReport};
pub use import::{
    discover_export_files, discover_export_files_with_prefix, ExportImportJob, ImportReport,
    EXPORT_FILE_PREFIX,
};
pub use recent::{RecentIngestJob, RecentIngestReport};
