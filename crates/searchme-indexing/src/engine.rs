//! The indexing engine: extraction, serialization, embedding and insertion
//! for single files and whole trees.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use searchme_embeddings::EmbeddingModel;
use searchme_extract::{ExtractError, MetadataExtractor};
use searchme_types::{context_string, IndexPosition};
use searchme_vector::{HnswIndex, RecordStore, VectorIndex};
use tracing::{debug, info, warn};

use crate::error::IndexingError;
use crate::progress::ProgressCallback;
use crate::stats::IndexingStats;
use crate::walker::{walk, SkipPolicy};

/// Why a visited file was not indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Could not be opened
    Unreadable,
    /// Rejected extension or not a regular file
    Unsupported,
    /// A format probe failed
    ExtractionFailed,
    /// The embedding model failed on the context string
    EmbeddingFailed,
}

/// Result of indexing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Indexed {
        size_bytes: u64,
        position: IndexPosition,
    },
    Skipped(SkipReason),
}

impl FileOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, FileOutcome::Indexed { .. })
    }
}

/// Turns files into records in a [`RecordStore`].
pub struct IndexingEngine<I: VectorIndex = HnswIndex> {
    extractor: Arc<dyn MetadataExtractor>,
    embedder: Arc<dyn EmbeddingModel>,
    store: RecordStore<I>,
    policy: SkipPolicy,
    cancel: Arc<AtomicBool>,
}

impl<I: VectorIndex> IndexingEngine<I> {
    pub fn new(
        extractor: Arc<dyn MetadataExtractor>,
        embedder: Arc<dyn EmbeddingModel>,
        store: RecordStore<I>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
            policy: SkipPolicy::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share a flag that stops directory walks between files when set.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn store(&self) -> &RecordStore<I> {
        &self.store
    }

    pub fn into_store(self) -> RecordStore<I> {
        self.store
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Index one file.
    ///
    /// Every per-file problem becomes [`FileOutcome::Skipped`] and leaves
    /// the store untouched. Only a vector index failure is an error.
    pub fn index_file(&mut self, path: &Path) -> Result<FileOutcome, IndexingError> {
        match fs::metadata(path) {
            Ok(meta) if !meta.is_file() => {
                // FIFOs and devices would block or never end on open
                debug!(path = %path.display(), "Skipping non-regular file");
                return Ok(FileOutcome::Skipped(SkipReason::Unsupported));
            }
            Ok(_) => {}
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipping unreadable file");
                return Ok(FileOutcome::Skipped(SkipReason::Unreadable));
            }
        }
        if let Err(err) = File::open(path) {
            debug!(path = %path.display(), error = %err, "Skipping unreadable file");
            return Ok(FileOutcome::Skipped(SkipReason::Unreadable));
        }

        let record = match self.extractor.extract(path) {
            Ok(record) => record,
            Err(ExtractError::Unsupported(reason)) => {
                debug!(path = %path.display(), %reason, "Skipping unsupported file");
                return Ok(FileOutcome::Skipped(SkipReason::Unsupported));
            }
            Err(ExtractError::Unreadable { source, .. }) => {
                debug!(path = %path.display(), error = %source, "Skipping unreadable file");
                return Ok(FileOutcome::Skipped(SkipReason::Unreadable));
            }
            Err(err @ ExtractError::Failed { .. }) => {
                warn!(path = %path.display(), error = %err, "Metadata extraction failed");
                return Ok(FileOutcome::Skipped(SkipReason::ExtractionFailed));
            }
        };

        let context = context_string(&record);
        let embedding = match self.embedder.embed(&context) {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Embedding failed");
                return Ok(FileOutcome::Skipped(SkipReason::EmbeddingFailed));
            }
        };

        let size_bytes = record.size_bytes;
        let position = self.store.insert(record, &embedding)?;
        debug!(path = %path.display(), position = %position, "Indexed file");

        Ok(FileOutcome::Indexed {
            size_bytes,
            position,
        })
    }

    /// Index every eligible file below `root`.
    pub fn index_directory(
        &mut self,
        root: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<IndexingStats, IndexingError> {
        self.index_paths(&[root.to_path_buf()], progress)
    }

    /// Index several base paths in order.
    ///
    /// A base that is a file is indexed directly. A missing base or a
    /// traversal failure is counted as an error and the walk moves on.
    pub fn index_paths(
        &mut self,
        paths: &[PathBuf],
        progress: &dyn ProgressCallback,
    ) -> Result<IndexingStats, IndexingError> {
        let start = Instant::now();
        let mut stats = IndexingStats::new();
        let policy = self.policy.clone();

        'bases: for base in paths {
            if self.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            if let Err(err) = base.symlink_metadata() {
                warn!(path = %base.display(), error = %err, "Cannot access base path");
                stats.record_error();
                continue;
            }

            if base.is_file() {
                let outcome = self.index_file(base)?;
                stats.record(&outcome);
                progress.on_file(&stats, base);
                continue;
            }

            info!(path = %base.display(), "Walking");
            for entry in walk(base, &policy) {
                if self.is_cancelled() {
                    stats.cancelled = true;
                    break 'bases;
                }
                match entry {
                    Ok(path) => {
                        let outcome = self.index_file(&path)?;
                        stats.record(&outcome);
                        progress.on_file(&stats, &path);
                    }
                    Err(err) => {
                        warn!(error = %err, "Error while walking directory");
                        stats.record_error();
                    }
                }
            }
        }

        stats.elapsed = start.elapsed();
        info!(
            indexed = stats.indexed,
            skipped = stats.skipped(),
            errors = stats.errors,
            bytes = stats.bytes_processed,
            cancelled = stats.cancelled,
            "Walk finished"
        );
        Ok(stats)
    }
}
