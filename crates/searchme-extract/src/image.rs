//! Image dimensions.

use std::path::Path;

use searchme_types::Dimensions;

use crate::error::ExtractError;

/// Width and height read from the image header; pixel data is not decoded.
pub fn probe(path: &Path) -> Result<Dimensions, ExtractError> {
    let (width, height) =
        ::image::image_dimensions(path).map_err(|e| ExtractError::failed(path, e))?;
    Ok(Dimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        ::image::RgbImage::new(32, 20).save(&path).unwrap();
        assert_eq!(probe(&path).unwrap(), Dimensions::new(32, 20));
    }

    #[test]
    fn test_truncated_header_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();
        assert!(matches!(probe(&path), Err(ExtractError::Failed { .. })));
    }
}
