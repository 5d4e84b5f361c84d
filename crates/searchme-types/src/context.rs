//! Context string serialization.
//!
//! The context string is the only text handed to the embedding model for a
//! file, so its layout decides what "similar" means at query time. Changing
//! labels, order or formatting invalidates previously built indexes.
//!
//! Layout: `Label: value` segments joined by [`SEGMENT_SEPARATOR`], always
//! starting with name, extension, size, created, modified and MIME type,
//! followed by whichever format-specific fields are present and finally a
//! flattened content preview.

use crate::record::MetadataRecord;

/// Number of content characters included in the context string.
pub const CONTENT_PREVIEW_CHARS: usize = 1000;

/// Separator between `Label: value` segments.
pub const SEGMENT_SEPARATOR: &str = " | ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `record` as the text that gets embedded.
pub fn context_string(record: &MetadataRecord) -> String {
    let mut parts = vec![
        format!("File name: {}", record.name),
        format!("Extension: {}", record.extension),
        format!("Size: {} bytes", record.size_bytes),
        format!("Created: {}", record.created_at.format(TIMESTAMP_FORMAT)),
        format!("Modified: {}", record.modified_at.format(TIMESTAMP_FORMAT)),
        format!("Type: {}", record.mime_type),
    ];

    if let Some(artist) = &record.artist {
        parts.push(format!("Artist: {}", artist));
    }
    if let Some(title) = &record.title {
        parts.push(format!("Title: {}", title));
    }
    if let Some(duration) = record.duration_seconds {
        parts.push(format!("Duration: {:.2} seconds", duration));
    }
    if let Some(dimensions) = record.dimensions {
        parts.push(format!("Dimensions: {}", dimensions));
    }
    if let Some(pages) = record.page_count.filter(|p| *p > 0) {
        parts.push(format!("Pages: {}", pages));
    }

    if let Some(preview) = record
        .content
        .as_deref()
        .and_then(|c| content_preview(c, CONTENT_PREVIEW_CHARS))
    {
        parts.push(format!("Content: {}", preview));
    }

    parts.join(SEGMENT_SEPARATOR)
}

/// First `max_chars` characters of `content` on a single line.
///
/// Newlines become spaces and surrounding whitespace is trimmed. Returns
/// `None` when nothing is left.
pub fn content_preview(content: &str, max_chars: usize) -> Option<String> {
    let head: String = content.chars().take(max_chars).collect();
    let flattened = head.replace('\n', " ");
    let trimmed = flattened.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
