//! Walk statistics and the end-of-run summary.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::engine::{FileOutcome, SkipReason};

/// Running tallies for one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexingStats {
    pub indexed: u64,
    pub unreadable: u64,
    pub unsupported: u64,
    pub extraction_failed: u64,
    pub embedding_failed: u64,
    /// Traversal failures, not per-file problems
    pub errors: u64,
    /// Sum of the sizes of indexed files
    pub bytes_processed: u64,
    #[serde(skip)]
    pub elapsed: Duration,
    /// The walk stopped early on request
    pub cancelled: bool,
}

impl IndexingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Indexed { size_bytes, .. } => {
                self.indexed += 1;
                self.bytes_processed += size_bytes;
            }
            FileOutcome::Skipped(SkipReason::Unreadable) => self.unreadable += 1,
            FileOutcome::Skipped(SkipReason::Unsupported) => self.unsupported += 1,
            FileOutcome::Skipped(SkipReason::ExtractionFailed) => self.extraction_failed += 1,
            FileOutcome::Skipped(SkipReason::EmbeddingFailed) => self.embedding_failed += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// All files that were visited but not indexed.
    pub fn skipped(&self) -> u64 {
        self.unreadable + self.unsupported + self.extraction_failed + self.embedding_failed
    }

    /// Files visited, whatever their outcome.
    pub fn processed(&self) -> u64 {
        self.indexed + self.skipped()
    }

    /// Indexed bytes per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_processed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for IndexingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexing Summary:")?;
        writeln!(f, "├─ Time elapsed: {}", format_elapsed(self.elapsed))?;
        writeln!(f, "├─ Files indexed: {}", self.indexed)?;
        writeln!(
            f,
            "├─ Total data processed: {}",
            format_size(self.bytes_processed as f64)
        )?;
        writeln!(f, "├─ Average speed: {}/s", format_size(self.throughput()))?;
        writeln!(
            f,
            "├─ Files skipped: {} ({} unreadable, {} unsupported, {} failed)",
            self.skipped(),
            self.unreadable,
            self.unsupported,
            self.extraction_failed + self.embedding_failed
        )?;
        write!(f, "└─ Errors encountered: {}", self.errors)?;
        if self.cancelled {
            write!(f, "\n   (interrupted before completion)")?;
        }
        Ok(())
    }
}

/// `bytes` in the largest unit below 1024, two decimals.
pub fn format_size(bytes: f64) -> String {
    let mut value = bytes;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}

/// `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchme_types::IndexPosition;

    #[test]
    fn test_record_outcomes() {
        let mut stats = IndexingStats::new();
        stats.record(&FileOutcome::Indexed {
            size_bytes: 100,
            position: IndexPosition::FIRST,
        });
        stats.record(&FileOutcome::Skipped(SkipReason::Unsupported));
        stats.record(&FileOutcome::Skipped(SkipReason::Unreadable));
        stats.record_error();

        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.bytes_processed, 100);
        assert_eq!(stats.skipped(), 2);
        assert_eq!(stats.processed(), 3);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512.0), "512.00 B");
        assert_eq!(format_size(1536.0), "1.50 KB");
        assert_eq!(format_size(3.0 * 1024.0 * 1024.0 * 1024.0), "3.00 GB");
        assert_eq!(format_size(2.0 * 1024f64.powi(4)), "2.00 TB");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn test_summary_lines() {
        let stats = IndexingStats {
            indexed: 3,
            unreadable: 1,
            unsupported: 1,
            bytes_processed: 2048,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        let summary = stats.to_string();
        assert!(summary.contains("Files indexed: 3"));
        assert!(summary.contains("Total data processed: 2.00 KB"));
        assert!(summary.contains("Average speed: 1.00 KB/s"));
        assert!(summary.contains("Files skipped: 2 (1 unreadable, 1 unsupported, 0 failed)"));
        assert!(summary.ends_with("Errors encountered: 0"));
    }
}
