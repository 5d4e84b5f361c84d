//! Plain-text content.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;

/// Read at most `max_bytes` of `path` as UTF-8.
///
/// Returns `Ok(None)` for content that is not valid UTF-8. A multi-byte
/// character cut by the byte limit is dropped rather than treated as
/// invalid.
pub fn read_text(path: &Path, max_bytes: u64) -> Result<Option<String>, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buf = Vec::new();
    file.take(max_bytes)
        .read_to_end(&mut buf)
        .map_err(|e| ExtractError::failed(path, e))?;
    let truncated = buf.len() as u64 == max_bytes;

    match String::from_utf8(buf) {
        Ok(text) => Ok(Some(text)),
        Err(err) => {
            let utf8 = err.utf8_error();
            if truncated && utf8.error_len().is_none() {
                let valid = utf8.valid_up_to();
                let mut bytes = err.into_bytes();
                bytes.truncate(valid);
                return Ok(String::from_utf8(bytes).ok());
            }
            debug!(path = %path.display(), "Content is not UTF-8");
            Ok(None)
        }
    }
}

/// Cut `text` to at most `max_bytes`, on a character boundary.
pub(crate) fn truncate_bytes(mut text: String, max_bytes: u64) -> String {
    let limit = usize::try_from(max_bytes).unwrap_or(usize::MAX);
    if text.len() > limit {
        let mut cut = limit;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
