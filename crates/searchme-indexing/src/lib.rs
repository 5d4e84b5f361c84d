//! # searchme-indexing
//!
//! The write path of searchme: walk base paths, extract each file's
//! metadata, render its context string, embed it and append it to the
//! record store.
//!
//! ## Key Components
//!
//! - [`IndexingEngine`]: `index_file`, `index_directory`, `index_paths`
//! - [`SkipPolicy`]: which directories and files a walk prunes
//! - [`IndexingStats`]: indexed / skipped / error tallies and the summary
//! - [`ProgressCallback`]: per-file progress hook
//!
//! Per-file problems never abort a walk; a vector index failure does.

pub mod engine;
pub mod error;
pub mod progress;
pub mod stats;
pub mod walker;

pub use engine::{FileOutcome, IndexingEngine, SkipReason};
pub use error::IndexingError;
pub use progress::{LoggingProgressCallback, NoOpProgressCallback, ProgressCallback};
pub use stats::{format_elapsed, format_size, IndexingStats};
pub use walker::{scan_paths, walk, ScanTotals, SkipPolicy, DEV_SKIP_DIRS, SYSTEM_SKIP_DIRS};
