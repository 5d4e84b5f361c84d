//! File metadata records and index positions.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Extensions that are rejected before any metadata is read.
pub const REJECTED_EXTENSIONS: &[&str] = &[".svg"];

/// Lowercased extension of `path` including the leading dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Whether files with this extension (as returned by [`extension_of`]) are never indexed.
pub fn is_rejected_extension(extension: &str) -> bool {
    REJECTED_EXTENSIONS
        .iter()
        .any(|rejected| rejected.eq_ignore_ascii_case(extension))
}

/// Slot assigned to a vector when it is appended to the index.
///
/// Positions start at 0, grow by one per insertion and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexPosition(u64);

impl IndexPosition {
    /// The position of the first vector in an empty index.
    pub const FIRST: IndexPosition = IndexPosition(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The position that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for IndexPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything extracted from one indexed file.
///
/// The optional fields are `Some` only when the matching format probe
/// succeeded. `None` means "unknown", never "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Absolute path; the record store's key
    pub path: PathBuf,
    /// Final path component
    pub name: String,
    /// Lowercased extension with leading dot, empty when the name has none
    pub extension: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Local>,
    pub modified_at: DateTime<Local>,
    pub mime_type: String,

    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub page_count: Option<u32>,
    /// Extracted text. Truncated to the preview length only when serialized
    /// for embedding.
    #[serde(default)]
    pub content: Option<String>,
}

impl MetadataRecord {
    /// Build a record with the basic filesystem facts.
    ///
    /// Fails for extensions in [`REJECTED_EXTENSIONS`] and for paths that
    /// are not valid UTF-8, so a record for such a file can never be
    /// constructed.
    pub fn new(
        path: impl Into<PathBuf>,
        size_bytes: u64,
        created_at: DateTime<Local>,
        modified_at: DateTime<Local>,
        mime_type: impl Into<String>,
    ) -> Result<Self, TypesError> {
        let path = path.into();
        if path.to_str().is_none() {
            return Err(TypesError::NonUtf8Path(path.to_string_lossy().into_owned()));
        }
        let extension = extension_of(&path);
        if is_rejected_extension(&extension) {
            return Err(TypesError::RejectedExtension(extension));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            extension,
            size_bytes,
            created_at,
            modified_at,
            mime_type: mime_type.into(),
            artist: None,
            title: None,
            duration_seconds: None,
            dimensions: None,
            page_count: None,
            content: None,
        })
    }

    /// Whether this record violates the rejected-extension invariant.
    ///
    /// Only reachable through deserialization of foreign data.
    pub fn has_rejected_extension(&self) -> bool {
        is_rejected_extension(&self.extension)
    }
}
