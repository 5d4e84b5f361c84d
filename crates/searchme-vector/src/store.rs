//! The record store: vector index plus the two mappings that give its
//! positions meaning.
//!
//! Invariant after every successful mutation and every load:
//! vector count == number of positions, positions are exactly
//! `0..n`, and the set of paths named by positions equals the set of
//! stored records. A path indexed twice owns two positions and one
//! (latest) record.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use searchme_embeddings::Embedding;
use searchme_types::{IndexPosition, MetadataRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{StoreError, VectorError};
use crate::hnsw::HnswIndex;
use crate::index::{Neighbor, VectorIndex};
use crate::persist::{
    encode_json, read_json, temp_sibling, MappingFile, MetadataFile, PositionEntry, INDEX_FILE,
    MAPPING_FILE, METADATA_FILE, PERSIST_FORMAT_VERSION,
};

/// Where the store keeps its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub index_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.index_dir.join(MAPPING_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.index_dir.join(METADATA_FILE)
    }

    pub fn artifact_paths(&self) -> [PathBuf; 3] {
        [self.index_path(), self.mapping_path(), self.metadata_path()]
    }
}

/// Snapshot of the store's size for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub vectors: usize,
    pub distinct_files: usize,
    pub dimension: Option<usize>,
    pub index_dir: PathBuf,
    /// Combined size of the artifacts currently on disk
    pub artifact_bytes: u64,
}

pub struct RecordStore<I: VectorIndex = HnswIndex> {
    config: StoreConfig,
    index_config: I::Config,
    index: Option<I>,
    positions: BTreeMap<IndexPosition, PathBuf>,
    records: HashMap<PathBuf, MetadataRecord>,
}

impl<I: VectorIndex> RecordStore<I> {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_index_config(config, I::Config::default())
    }

    pub fn with_index_config(config: StoreConfig, index_config: I::Config) -> Self {
        Self {
            config,
            index_config,
            index: None,
            positions: BTreeMap::new(),
            records: HashMap::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether an index has been created or loaded.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Number of vectors (and positions).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn distinct_files(&self) -> usize {
        self.records.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(VectorIndex::dimension)
    }

    /// The position the next inserted vector will get.
    pub fn next_position(&self) -> IndexPosition {
        IndexPosition::new(self.positions.len() as u64)
    }

    /// Append `embedding` for `record` and link it to the record's path.
    ///
    /// The index is created from the first embedding's dimension. Records
    /// that could not be saved (rejected extension, path that is not
    /// UTF-8) are refused. On any error nothing is changed.
    pub fn insert(
        &mut self,
        record: MetadataRecord,
        embedding: &Embedding,
    ) -> Result<IndexPosition, VectorError> {
        if record.has_rejected_extension() || record.path.to_str().is_none() {
            return Err(VectorError::RejectedRecord(record.path));
        }

        let position = self.next_position();
        match self.index.as_mut() {
            Some(index) => {
                if index.dimension() != embedding.dimension() {
                    return Err(VectorError::DimensionMismatch {
                        expected: index.dimension(),
                        actual: embedding.dimension(),
                    });
                }
                index.add(position, embedding)?;
            }
            None => {
                let mut index = I::create(embedding.dimension(), &self.index_config)?;
                index.add(position, embedding)?;
                self.index = Some(index);
            }
        }

        debug!(position = %position, path = %record.path.display(), "Stored record");
        self.positions.insert(position, record.path.clone());
        self.records.insert(record.path.clone(), record);
        Ok(position)
    }

    /// Up to `k` nearest positions, closest first.
    pub fn nearest(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        let index = self.index.as_ref().ok_or(VectorError::NotInitialized)?;
        index.search(query, k)
    }

    pub fn path_at(&self, position: IndexPosition) -> Option<&Path> {
        self.positions.get(&position).map(PathBuf::as_path)
    }

    pub fn record(&self, path: &Path) -> Option<&MetadataRecord> {
        self.records.get(path)
    }

    /// Path and record for a position, if both exist.
    pub fn lookup(&self, position: IndexPosition) -> Option<(&Path, &MetadataRecord)> {
        let path = self.path_at(position)?;
        Some((path, self.record(path)?))
    }

    pub fn records(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.records.values()
    }

    /// Drop the index and both mappings.
    pub fn reset(&mut self) {
        self.index = None;
        self.positions.clear();
        self.records.clear();
    }

    /// Verify the three structures agree.
    pub fn check_consistency(&self) -> Result<(), StoreError> {
        let vectors = self.index.as_ref().map_or(0, VectorIndex::len);
        check_agreement(vectors, &self.positions, &self.records)
    }

    /// Write all three artifacts. Returns the number of vectors saved.
    ///
    /// Everything is encoded and staged beside the targets before any of
    /// them is replaced, so a failed save leaves the previous one loadable.
    pub fn save(&self) -> Result<usize, StoreError> {
        let index = match &self.index {
            Some(index) if !self.positions.is_empty() => index,
            _ => return Err(StoreError::Empty),
        };
        self.check_consistency()?;

        let mapping = encode_json(&MappingFile {
            version: PERSIST_FORMAT_VERSION,
            dimension: index.dimension(),
            entries: self
                .positions
                .iter()
                .map(|(position, path)| PositionEntry {
                    position: *position,
                    path: path.clone(),
                })
                .collect(),
        })?;

        let mut records: Vec<MetadataRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        let metadata = encode_json(&MetadataFile {
            version: PERSIST_FORMAT_VERSION,
            records,
        })?;

        fs::create_dir_all(&self.config.index_dir)?;
        info!(dir = %self.config.index_dir.display(), "Saving index");

        let targets = self.config.artifact_paths();
        let staged = targets.clone().map(|target| temp_sibling(&target));
        let written = index
            .save(&staged[0])
            .map_err(StoreError::from)
            .and_then(|()| fs::write(&staged[1], &mapping).map_err(StoreError::from))
            .and_then(|()| fs::write(&staged[2], &metadata).map_err(StoreError::from));
        if let Err(err) = written {
            for tmp in &staged {
                if tmp.is_file() {
                    if let Err(cleanup) = fs::remove_file(tmp) {
                        warn!(
                            path = %tmp.display(),
                            error = %cleanup,
                            "Failed to remove staged artifact"
                        );
                    }
                }
            }
            return Err(err);
        }

        for (tmp, target) in staged.iter().zip(&targets) {
            fs::rename(tmp, target)?;
        }

        info!(vectors = self.len(), files = self.distinct_files(), "Saved index");
        Ok(self.len())
    }

    /// Replace the in-memory state with the saved artifacts.
    ///
    /// On any error the store is left empty. Returns the number of
    /// vectors loaded.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        self.reset();

        let missing: Vec<PathBuf> = self
            .config
            .artifact_paths()
            .into_iter()
            .filter(|p| !p.is_file())
            .collect();
        if !missing.is_empty() {
            for path in &missing {
                warn!(path = %path.display(), "Index artifact not found");
            }
            return Err(StoreError::MissingArtifacts(missing));
        }

        match self.read_artifacts() {
            Ok((index, positions, records)) => {
                self.index = Some(index);
                self.positions = positions;
                self.records = records;
                info!(
                    vectors = self.len(),
                    files = self.distinct_files(),
                    "Loaded index"
                );
                Ok(self.len())
            }
            Err(err) => {
                warn!(error = %err, "Discarding unreadable index");
                self.reset();
                Err(err)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn read_artifacts(
        &self,
    ) -> Result<
        (
            I,
            BTreeMap<IndexPosition, PathBuf>,
            HashMap<PathBuf, MetadataRecord>,
        ),
        StoreError,
    > {
        let mapping: MappingFile = read_json(&self.config.mapping_path())?;
        let metadata: MetadataFile = read_json(&self.config.metadata_path())?;
        let index = I::load(
            &self.config.index_path(),
            mapping.dimension,
            &self.index_config,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut positions = BTreeMap::new();
        for (expected, entry) in mapping.entries.into_iter().enumerate() {
            if entry.position.get() != expected as u64 {
                return Err(StoreError::Corrupt(format!(
                    "position {} found where {} was expected",
                    entry.position, expected
                )));
            }
            positions.insert(entry.position, entry.path);
        }

        let mut records = HashMap::with_capacity(metadata.records.len());
        for record in metadata.records {
            if record.has_rejected_extension() {
                return Err(StoreError::Corrupt(format!(
                    "record for unsupported file {}",
                    record.path.display()
                )));
            }
            records.insert(record.path.clone(), record);
        }

        check_agreement(index.len(), &positions, &records)?;
        Ok((index, positions, records))
    }

    pub fn stats(&self) -> StoreStats {
        let artifact_bytes = self
            .config
            .artifact_paths()
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        StoreStats {
            vectors: self.len(),
            distinct_files: self.distinct_files(),
            dimension: self.dimension(),
            index_dir: self.config.index_dir.clone(),
            artifact_bytes,
        }
    }
}

fn check_agreement(
    vectors: usize,
    positions: &BTreeMap<IndexPosition, PathBuf>,
    records: &HashMap<PathBuf, MetadataRecord>,
) -> Result<(), StoreError> {
    let linked: HashSet<&PathBuf> = positions.values().collect();
    let agree = vectors == positions.len()
        && linked.len() == records.len()
        && linked.iter().all(|path| records.contains_key(*path));

    if agree {
        Ok(())
    } else {
        Err(StoreError::Inconsistent {
            vectors,
            positions: positions.len(),
            records: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn record(path: &str, size: u64) -> MetadataRecord {
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        MetadataRecord::new(path, size, at, at, "text/plain").unwrap()
    }

    fn axis(dim: usize, hot: usize) -> Embedding {
        let mut values = vec![0.0; dim];
        values[hot] = 1.0;
        Embedding::new(values)
    }

    fn store(dir: &TempDir) -> RecordStore {
        RecordStore::new(StoreConfig::new(dir.path().join("index")))
    }

    /// Index whose inserts always fail.
    struct BrokenIndex;

    impl VectorIndex for BrokenIndex {
        type Config = ();

        fn create(_: usize, _: &()) -> Result<Self, VectorError> {
            Ok(BrokenIndex)
        }

        fn load(_: &Path, _: usize, _: &()) -> Result<Self, VectorError> {
            Err(VectorError::Index("unreadable".to_string()))
        }

        fn save(&self, _: &Path) -> Result<(), VectorError> {
            Ok(())
        }

        fn dimension(&self) -> usize {
            4
        }

        fn len(&self) -> usize {
            0
        }

        fn add(&mut self, _: IndexPosition, _: &Embedding) -> Result<(), VectorError> {
            Err(VectorError::Index("disk full".to_string()))
        }

        fn search(&self, _: &Embedding, _: usize) -> Result<Vec<Neighbor>, VectorError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_positions_are_sequential() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        assert_eq!(store.next_position(), IndexPosition::FIRST);

        for i in 0..3 {
            let pos = store
                .insert(record(&format!("/d/{}.txt", i), 1), &axis(4, i))
                .unwrap();
            assert_eq!(pos, IndexPosition::new(i as u64));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.distinct_files(), 3);
        assert_eq!(store.dimension(), Some(4));
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_reinsert_appends_and_overwrites_record() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 10), &axis(4, 0)).unwrap();
        store.insert(record("/d/a.txt", 20), &axis(4, 1)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.distinct_files(), 1);
        assert_eq!(store.record(Path::new("/d/a.txt")).unwrap().size_bytes, 20);
        assert_eq!(store.path_at(IndexPosition::FIRST), Some(Path::new("/d/a.txt")));
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_dimension_mismatch_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();

        let err = store.insert(record("/d/b.txt", 1), &axis(8, 0)).unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { expected: 4, actual: 8 }));
        assert_eq!(store.len(), 1);
        assert!(store.record(Path::new("/d/b.txt")).is_none());
    }

    #[test]
    fn test_failed_add_leaves_no_partial_state() {
        let dir = TempDir::new().unwrap();
        let mut store: RecordStore<BrokenIndex> =
            RecordStore::new(StoreConfig::new(dir.path()));

        assert!(store.insert(record("/d/a.txt", 1), &axis(4, 0)).is_err());
        assert!(!store.has_index());
        assert!(store.is_empty());
        assert_eq!(store.distinct_files(), 0);
        assert_eq!(store.next_position(), IndexPosition::FIRST);
    }

    #[test]
    fn test_rejected_record_is_refused() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut rec = record("/d/logo.txt", 1);
        rec.extension = ".svg".to_string();
        assert!(matches!(
            store.insert(rec, &axis(4, 0)),
            Err(VectorError::RejectedRecord(_))
        ));
        assert!(!store.has_index());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_path_is_refused() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();

        let mut rec = record("/d/placeholder.txt", 1);
        rec.path = PathBuf::from(OsStr::from_bytes(b"/d/caf\xe9.txt"));
        assert!(matches!(
            store.insert(rec, &axis(4, 1)),
            Err(VectorError::RejectedRecord(_))
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.save().unwrap(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        store.save().unwrap();

        store.insert(record("/d/b.txt", 1), &axis(4, 1)).unwrap();
        // a directory in the way of the staged mapping fails the second save
        // after the index has been written
        fs::create_dir(temp_sibling(&store.config().mapping_path())).unwrap();
        assert!(matches!(store.save(), Err(StoreError::Io(_))));
        assert!(!temp_sibling(&store.config().index_path()).exists());

        let mut reloaded = RecordStore::<HnswIndex>::new(store.config().clone());
        assert_eq!(reloaded.load().unwrap(), 1);
        assert!(reloaded.record(Path::new("/d/a.txt")).is_some());
        assert!(reloaded.record(Path::new("/d/b.txt")).is_none());
    }

    #[test]
    fn test_nearest_without_index() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.nearest(&axis(4, 0), 3),
            Err(VectorError::NotInitialized)
        ));
    }

    #[test]
    fn test_save_empty_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(store.save(), Err(StoreError::Empty)));
        assert!(!store.config().index_dir.exists());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut original = store(&dir);
        for i in 0..4 {
            original
                .insert(record(&format!("/d/{}.txt", i), i as u64), &axis(4, i))
                .unwrap();
        }
        original
            .insert(record("/d/0.txt", 99), &Embedding::new(vec![1.0; 4]))
            .unwrap();
        assert_eq!(original.save().unwrap(), 5);

        let mut reloaded = store(&dir);
        assert_eq!(reloaded.load().unwrap(), 5);
        assert_eq!(reloaded.distinct_files(), 4);
        assert_eq!(reloaded.record(Path::new("/d/0.txt")).unwrap().size_bytes, 99);
        reloaded.check_consistency().unwrap();

        let query = Embedding::new(vec![0.9, 0.4, 0.1, 0.0]);
        let before = original.nearest(&query, 5).unwrap();
        let after = reloaded.nearest(&query, 5).unwrap();
        assert_eq!(
            before.iter().map(|n| n.position).collect::<Vec<_>>(),
            after.iter().map(|n| n.position).collect::<Vec<_>>()
        );

        // appending after a load continues the sequence
        let pos = reloaded.insert(record("/d/new.txt", 1), &axis(4, 3)).unwrap();
        assert_eq!(pos, IndexPosition::new(5));
    }

    #[test]
    fn test_load_with_missing_artifact_resets() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        store.save().unwrap();
        fs::remove_file(store.config().metadata_path()).unwrap();

        match store.load() {
            Err(StoreError::MissingArtifacts(paths)) => {
                assert_eq!(paths, vec![store.config().metadata_path()]);
            }
            other => panic!("expected missing artifacts, got {:?}", other),
        }
        assert!(!store.has_index());
        assert!(store.is_empty());
        assert_eq!(store.distinct_files(), 0);
    }

    #[test]
    fn test_load_corrupt_mapping_resets() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        store.save().unwrap();
        fs::write(store.config().mapping_path(), b"{not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
        assert!(!store.has_index());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_disagreeing_artifacts_resets() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        store.insert(record("/d/b.txt", 1), &axis(4, 1)).unwrap();
        store.save().unwrap();

        let only_a = MetadataFile {
            version: PERSIST_FORMAT_VERSION,
            records: vec![record("/d/a.txt", 1)],
        };
        fs::write(
            store.config().metadata_path(),
            encode_json(&only_a).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            store.load(),
            Err(StoreError::Inconsistent { vectors: 2, positions: 2, records: 1 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unloadable_index_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut healthy = store(&dir);
        healthy.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        healthy.save().unwrap();

        let mut broken: RecordStore<BrokenIndex> =
            RecordStore::new(StoreConfig::new(dir.path().join("index")));
        assert!(matches!(broken.load(), Err(StoreError::Corrupt(_))));
        assert!(!broken.has_index());
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.insert(record("/d/a.txt", 1), &axis(4, 0)).unwrap();
        assert_eq!(store.stats().artifact_bytes, 0);
        store.save().unwrap();

        let stats = store.stats();
        assert_eq!(stats.vectors, 1);
        assert_eq!(stats.distinct_files, 1);
        assert_eq!(stats.dimension, Some(4));
        assert!(stats.artifact_bytes > 0);
    }
}
