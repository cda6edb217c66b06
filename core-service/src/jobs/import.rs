use crate::error::{CoreError, Result};
use core_runtime::logging::strip_path;
use core_history::{normalize_export_row, ExportRow, PlayEvent, PlayEventRepository, SaveOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub files: usize,
    /// Rows read across all files
    pub rows: usize,
    /// Rows that normalized into a play
    pub accepted: usize,
    pub inserted: u64,
    pub skipped: u64,
}

/// File name prefix of the audio history files in a personal-data export.
pub const EXPORT_FILE_PREFIX: &str = "Streaming_History_Audio";

/// Audio history files directly inside `dir`, sorted by name.
///
/// Other JSON files of the export (`Userdata.json`, video history, ...) are
/// skipped.
pub async fn discover_export_files(dir: &Path) -> Result<Vec<PathBuf>> {
    discover_export_files_with_prefix(dir, EXPORT_FILE_PREFIX).await
}

/// `.json` files directly inside `dir` whose name starts with `prefix`,
/// sorted by name.
pub async fn discover_export_files_with_prefix(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let import_error = |e: std::io::Error| CoreError::Import {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(import_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(import_error)? {
        let path = entry.path();
        let matches_prefix = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix));
        if matches_prefix && path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Load personal-data export files into the store.
pub struct ExportImportJob {
    store: Arc<dyn PlayEventRepository>,
    batch_size: usize,
}

impl ExportImportJob {
    pub fn new(store: Arc<dyn PlayEventRepository>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Import every file in order.
    ///
    /// Batches already saved stay saved when a later file fails; re-running
    /// the import is safe.
    #[instrument(skip(self, paths), fields(files = paths.len(), batch_size = self.batch_size))]
    pub async fn run(&self, paths: &[PathBuf]) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for path in paths {
            let rows = read_export(path).await?;
            report.files += 1;
            report.rows += rows.len();

            let events: Vec<PlayEvent> = rows.iter().filter_map(normalize_export_row).collect();
            report.accepted += events.len();

            let mut outcome = SaveOutcome::default();
            for batch in events.chunks(self.batch_size) {
                outcome.merge(self.store.save_events(batch).await?);
            }
            report.inserted += outcome.inserted;
            report.skipped += outcome.skipped;

            let file = path.to_string_lossy();
            debug!(
                file = strip_path(&file),
                rows = rows.len(),
                accepted = events.len(),
                inserted = outcome.inserted,
                "Imported export file"
            );
        }

        info!(
            files = report.files,
            rows = report.rows,
            inserted = report.inserted,
            skipped = report.skipped,
            "Export import finished"
        );
        Ok(report)
    }
}

async fn read_export(path: &Path) -> Result<Vec<ExportRow>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| CoreError::Import {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_slice(&bytes).map_err(|e| CoreError::Import {
        path: path.to_path_buf(),
        reason: format!("not an export row array: {e}"),
    })
}
