//! # searchme-types
//!
//! Shared domain types for the searchme file index.
//!
//! This crate defines the data that flows between the extractor, the
//! record store and the query side:
//! - [`MetadataRecord`]: everything known about one indexed file
//! - [`IndexPosition`]: the sequential slot a vector occupies in the index
//! - [`context_string`]: the text that gets embedded for a record
//! - [`Settings`]: layered configuration for the binary
//!
//! ## Usage
//!
//! ```rust
//! use searchme_types::{context_string, MetadataRecord};
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod record;

pub use config::{
    EmbeddingSettings, IndexingSettings, SearchSettings, Settings, SummarizerSettings,
};
pub use context::{content_preview, context_string, CONTENT_PREVIEW_CHARS, SEGMENT_SEPARATOR};
pub use error::TypesError;
pub use record::{
    extension_of, is_rejected_extension, Dimensions, IndexPosition, MetadataRecord,
    REJECTED_EXTENSIONS,
};
