//! Progress reporting during a walk.

use std::path::Path;

use tracing::info;

use crate::stats::IndexingStats;

/// Receives a call after every visited file.
pub trait ProgressCallback: Send {
    fn on_file(&self, stats: &IndexingStats, current: &Path);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_file(&self, _stats: &IndexingStats, _current: &Path) {}
}

/// Logs a line at info level every `every` files.
pub struct LoggingProgressCallback {
    every: u64,
    total: Option<u64>,
}

impl LoggingProgressCallback {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1) as u64,
            total: None,
        }
    }

    /// Include the pre-scanned file count in progress lines.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

impl ProgressCallback for LoggingProgressCallback {
    fn on_file(&self, stats: &IndexingStats, current: &Path) {
        let processed = stats.processed();
        if processed % self.every == 0 {
            info!(
                processed,
                total = self.total,
                indexed = stats.indexed,
                skipped = stats.skipped(),
                current = %current.display(),
                "Indexing progress"
            );
        }
    }
}
