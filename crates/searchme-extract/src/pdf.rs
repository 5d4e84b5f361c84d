//! PDF page count, title and text via lopdf.

use std::path::Path;

use lopdf::{Document, Object};
use tracing::debug;

use crate::error::ExtractError;
use crate::text::truncate_bytes;

/// What a PDF probe yields.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PdfInfo {
    pub page_count: u32,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Parse `path` as a PDF.
///
/// A document lopdf cannot load is a failure. Text extraction problems on
/// a loadable document only leave `content` empty.
pub fn probe(path: &Path, max_text_bytes: u64) -> Result<PdfInfo, ExtractError> {
    let doc = Document::load(path).map_err(|e| ExtractError::failed(path, e))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let title = document_title(&doc);

    let content = match doc.extract_text(&pages) {
        Ok(text) => Some(truncate_bytes(text, max_text_bytes)),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "No extractable PDF text");
            None
        }
    };

    Ok(PdfInfo {
        page_count: pages.len() as u32,
        title,
        content,
    })
}

/// `/Title` from the trailer's info dictionary, if non-empty.
fn document_title(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let title = match info.as_dict().ok()?.get(b"Title").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match title {
        Object::String(bytes, _) => {
            let decoded = decode_pdf_string(bytes);
            let trimmed = decoded.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a BOM or PDFDocEncoding; the latter
/// is read as Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
