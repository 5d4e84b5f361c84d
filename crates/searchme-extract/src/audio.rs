//! Audio tags and duration via lofty.

use std::path::Path;

use lofty::prelude::*;

use crate::error::ExtractError;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioInfo {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
}

pub fn probe(path: &Path) -> Result<AudioInfo, ExtractError> {
    let tagged = lofty::read_from_path(path).map_err(|e| ExtractError::failed(path, e))?;

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
    let non_empty = |value: Option<std::borrow::Cow<'_, str>>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let duration = tagged.properties().duration();

    Ok(AudioInfo {
        artist: tag.and_then(|t| non_empty(t.artist())),
        title: tag.and_then(|t| non_empty(t.title())),
        duration_seconds: (!duration.is_zero()).then(|| duration.as_secs_f64()),
    })
}
