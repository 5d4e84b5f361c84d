//! On-disk layout of a saved record store.
//!
//! Three artifacts in one directory, written and read together:
//! - [`INDEX_FILE`]: the vector index in usearch's native format
//! - [`MAPPING_FILE`]: position to path entries plus the index dimension
//! - [`METADATA_FILE`]: one [`MetadataRecord`] per distinct path
//!
//! Both JSON files carry [`PERSIST_FORMAT_VERSION`]; any other version is
//! treated as corruption. Paths are stored as strings, so the store only
//! accepts records whose path is valid UTF-8.

use std::fs;
use std::path::{Path, PathBuf};

use searchme_types::{IndexPosition, MetadataRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const INDEX_FILE: &str = "file_index.usearch";
pub const MAPPING_FILE: &str = "file_mapping.json";
pub const METADATA_FILE: &str = "metadata_mapping.json";

pub const PERSIST_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PositionEntry {
    pub position: IndexPosition,
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MappingFile {
    pub version: u32,
    pub dimension: usize,
    pub entries: Vec<PositionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MetadataFile {
    pub version: u32,
    pub records: Vec<MetadataRecord>,
}

pub(crate) trait Versioned {
    fn version(&self) -> u32;
}

impl Versioned for MappingFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for MetadataFile {
    fn version(&self) -> u32 {
        self.version
    }
}

/// Sibling path used while an artifact is being written.
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

pub(crate) fn read_json<T: DeserializeOwned + Versioned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path)?;
    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;
    if value.version() != PERSIST_FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "{}: format version {} (expected {})",
            path.display(),
            value.version(),
            PERSIST_FORMAT_VERSION
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_sibling() {
        assert_eq!(
            temp_sibling(Path::new("/idx/file_mapping.json")),
            PathBuf::from("/idx/file_mapping.json.tmp")
        );
    }

    #[test]
    fn test_mapping_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MAPPING_FILE);
        let mapping = MappingFile {
            version: PERSIST_FORMAT_VERSION,
            dimension: 4,
            entries: vec![PositionEntry {
                position: IndexPosition::FIRST,
                path: PathBuf::from("/docs/a.txt"),
            }],
        };
        fs::write(&path, encode_json(&mapping).unwrap()).unwrap();

        let read: MappingFile = read_json(&path).unwrap();
        assert_eq!(read.dimension, 4);
        assert_eq!(read.entries, mapping.entries);
    }

    #[test]
    fn test_wrong_version_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MAPPING_FILE);
        fs::write(&path, r#"{"version": 99, "dimension": 4, "entries": []}"#).unwrap();
        let result: Result<MappingFile, _> = read_json(&path);
        assert!(matches!(result, Err(StoreError::Corrupt(msg)) if msg.contains("version 99")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_path_fails_to_encode() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mapping = MappingFile {
            version: PERSIST_FORMAT_VERSION,
            dimension: 4,
            entries: vec![PositionEntry {
                position: IndexPosition::FIRST,
                path: PathBuf::from(OsStr::from_bytes(b"/docs/caf\xe9.txt")),
            }],
        };
        assert!(matches!(encode_json(&mapping), Err(StoreError::Encode(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(METADATA_FILE);
        fs::write(&path, b"\x80\x04pickle").unwrap();
        let result: Result<MetadataFile, _> = read_json(&path);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
