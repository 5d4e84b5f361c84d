//! The metadata extractor seam and its filesystem implementation.

use std::fs::{self, File};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use searchme_types::{extension_of, is_rejected_extension, MetadataRecord};
use tracing::debug;

use crate::error::ExtractError;
use crate::{audio, docx, image, pdf, text};

/// MIME type for files whose type cannot be guessed.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Default cap on text read from one file.
const DEFAULT_MAX_TEXT_BYTES: u64 = 8 * 1024 * 1024;

/// Produces a [`MetadataRecord`] for a path.
///
/// Implementations must close every handle they open before returning.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError>;
}

/// Extracts from the local filesystem, dispatching on MIME type.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    max_text_bytes: u64,
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEXT_BYTES)
    }
}

impl FileExtractor {
    pub fn new(max_text_bytes: u64) -> Self {
        Self { max_text_bytes }
    }

    fn basic_record(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let unreadable = |source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let meta = fs::metadata(path).map_err(unreadable)?;
        if !meta.is_file() {
            return Err(ExtractError::Unsupported(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        // Readability check; the handle is dropped right away.
        File::open(path).map_err(unreadable)?;

        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = meta.created().unwrap_or(modified);
        let mime = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        Ok(MetadataRecord::new(
            path,
            meta.len(),
            DateTime::<Local>::from(created),
            DateTime::<Local>::from(modified),
            mime,
        )?)
    }

    fn fill_specific(&self, record: &mut MetadataRecord) -> Result<(), ExtractError> {
        let path = record.path.clone();
        let mime = record.mime_type.as_str();

        if mime.starts_with("text/") {
            record.content = non_empty(text::read_text(&path, self.max_text_bytes)?);
        } else if mime == "application/pdf" {
            let info = pdf::probe(&path, self.max_text_bytes)?;
            record.page_count = non_zero(info.page_count);
            record.title = non_empty(info.title);
            record.content = non_empty(info.content);
        } else if record.extension == ".docx" {
            let info = docx::probe(&path, self.max_text_bytes)?;
            record.page_count = non_zero(info.paragraph_count);
            record.content = non_empty(Some(info.content));
        } else if mime.starts_with("audio/") {
            let info = audio::probe(&path)?;
            record.artist = non_empty(info.artist);
            record.title = non_empty(info.title);
            record.duration_seconds = info.duration_seconds.filter(|d| *d > 0.0);
        } else if mime.starts_with("image/") {
            record.dimensions = Some(image::probe(&path)?);
        }
        Ok(())
    }
}

/// Blank text is recorded as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_zero(count: u32) -> Option<u32> {
    (count > 0).then_some(count)
}

impl MetadataExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataRecord, ExtractError> {
        let extension = extension_of(path);
        if is_rejected_extension(&extension) {
            return Err(ExtractError::Unsupported(extension));
        }
        if path.to_str().is_none() {
            return Err(ExtractError::Unsupported(format!(
                "{} is not valid UTF-8",
                path.display()
            )));
        }

        let mut record = self.basic_record(path)?;
        self.fill_specific(&mut record)?;

        debug!(path = %path.display(), mime = %record.mime_type, "Extracted metadata");
        Ok(record)
    }
}
