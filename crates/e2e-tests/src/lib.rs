//! End-to-end test infrastructure for searchme.
//!
//! Provides a shared TestHarness, a deterministic stand-in for the
//! embedding model and fixture writers for the file formats the
//! extractor understands.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use searchme_embeddings::{Embedding, EmbeddingError, EmbeddingModel, ModelInfo};
use searchme_extract::FileExtractor;
use searchme_indexing::IndexingEngine;
use searchme_retrieval::{QueryEngine, SearchHit};
use searchme_vector::{RecordStore, StoreConfig};

/// Dimension of [`StubEmbedder`] vectors.
pub const STUB_DIMENSION: usize = 256;

/// Hashed bag-of-words embedder.
///
/// Every lowercase alphanumeric token adds one to the bucket its FNV-1a
/// hash selects. Texts sharing words end up close together, which is
/// enough to check ranking without downloading a model.
pub struct StubEmbedder {
    info: ModelInfo,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            info: ModelInfo {
                name: "stub-bag-of-words".to_string(),
                dimension: STUB_DIMENSION,
                max_sequence_length: usize::MAX,
            },
        }
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for StubEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut values = vec![0.0f32; STUB_DIMENSION];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % STUB_DIMENSION;
            values[bucket] += 1.0;
        }
        Ok(Embedding::new(values))
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Scratch corpus and index directories for one test.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Files to be indexed live here
    pub corpus_dir: PathBuf,
    /// Index artifacts are written here
    pub index_dir: PathBuf,
    pub embedder: Arc<StubEmbedder>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let corpus_dir = temp_dir.path().join("corpus");
        let index_dir = temp_dir.path().join("index");
        fs::create_dir_all(&corpus_dir).expect("Failed to create corpus dir");
        fs::create_dir_all(&index_dir).expect("Failed to create index dir");

        Self {
            _temp_dir: temp_dir,
            corpus_dir,
            index_dir,
            embedder: Arc::new(StubEmbedder::new()),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.index_dir)
    }

    /// An engine over an empty store rooted at `index_dir`.
    pub fn engine(&self) -> IndexingEngine {
        self.engine_with(RecordStore::new(self.store_config()))
    }

    pub fn engine_with(&self, store: RecordStore) -> IndexingEngine {
        IndexingEngine::new(
            Arc::new(FileExtractor::default()),
            self.embedder.clone(),
            store,
        )
    }

    /// A store loaded from `index_dir`.
    pub fn load_store(&self) -> RecordStore {
        let mut store = RecordStore::new(self.store_config());
        store.load().expect("Failed to load saved index");
        store
    }

    pub fn search(&self, store: &RecordStore, query: &str, k: usize) -> Vec<SearchHit> {
        QueryEngine::new(self.embedder.clone(), store)
            .search(query, k)
            .expect("Search failed")
    }

    fn corpus_path(&self, name: &str) -> PathBuf {
        self.corpus_dir.join(name)
    }

    pub fn write_text(&self, name: &str, content: &str) -> PathBuf {
        let path = self.corpus_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write text file");
        path
    }

    pub fn write_pdf(&self, name: &str, text: &str, title: Option<&str>) -> PathBuf {
        let path = self.corpus_path(name);
        write_pdf(&path, text, title);
        path
    }

    pub fn write_jpg(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.corpus_path(name);
        image::RgbImage::new(width, height)
            .save(&path)
            .expect("Failed to write jpg");
        path
    }

    /// A path the indexer cannot read.
    ///
    /// Permission bits do not stop root, so when the chmod'ed file is still
    /// readable it is replaced by a dangling symlink.
    #[cfg(unix)]
    pub fn write_unreadable(&self, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_text(name, "locked away");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000))
            .expect("Failed to chmod file");

        if fs::File::open(&path).is_ok() {
            fs::remove_file(&path).expect("Failed to remove file");
            std::os::unix::fs::symlink(self.corpus_path("does-not-exist"), &path)
                .expect("Failed to create symlink");
        }
        path
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a one-page PDF showing `text`, with an optional `/Title`.
pub fn write_pdf(path: &Path, text: &str, title: Option<&str>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 750.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode PDF content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }
    doc.save(path).expect("Failed to save PDF");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_embedder_is_deterministic() {
        let embedder = StubEmbedder::new();
        let a = embedder.embed("Budget spreadsheet").unwrap();
        let b = embedder.embed("budget SPREADSHEET").unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.dimension(), STUB_DIMENSION);
    }

    #[test]
    fn test_stub_embedder_shared_words_are_closer() {
        let embedder = StubEmbedder::new();
        let query = embedder.embed("budget spreadsheet").unwrap();
        let near = embedder.embed("the q3 budget spreadsheet").unwrap();
        let far = embedder.embed("holiday photos from the beach").unwrap();
        assert!(query.squared_distance(&near) < query.squared_distance(&far));
    }
}
