//! Model file resolution.
//!
//! A model is named either by a HuggingFace repository id or by a local
//! directory that already holds the required files. Hub downloads land in
//! the configured cache directory and are reused on later runs.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use searchme_types::EmbeddingSettings;
use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Files a BERT sentence-embedding model needs.
pub const REQUIRED_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Where to find (or put) model files.
#[derive(Debug, Clone)]
pub struct ModelCache {
    pub cache_dir: PathBuf,
    /// HuggingFace repository id, or a local directory path
    pub model: String,
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(settings.cache_dir.clone(), settings.model_repo.clone())
    }

    /// The model's directory when `model` names a local directory.
    pub fn local_dir(&self) -> Option<&Path> {
        let path = Path::new(&self.model);
        path.is_dir().then_some(path)
    }

    /// Short display name: the last component of the repository id or path.
    pub fn model_name(&self) -> &str {
        self.model
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.model)
    }
}

/// Paths to the three model files.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        }
    }
}

/// Locate model files, downloading them from the Hub when needed.
pub fn resolve_model_files(cache: &ModelCache) -> Result<ModelFiles, EmbeddingError> {
    if let Some(dir) = cache.local_dir() {
        let missing: Vec<&str> = REQUIRED_FILES
            .iter()
            .copied()
            .filter(|f| !dir.join(f).is_file())
            .collect();
        if !missing.is_empty() {
            return Err(EmbeddingError::InvalidConfig(format!(
                "{} is missing {}",
                dir.display(),
                missing.join(", ")
            )));
        }
        debug!(path = %dir.display(), "Using local model directory");
        return Ok(ModelFiles::in_dir(dir));
    }

    std::fs::create_dir_all(&cache.cache_dir)?;
    let api = ApiBuilder::new()
        .with_cache_dir(cache.cache_dir.clone())
        .with_progress(false)
        .build()
        .map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(cache.model.clone());

    info!(repo = %cache.model, cache = %cache.cache_dir.display(), "Resolving model files");

    // `get` serves from the cache when the file is already there.
    let fetch = |file: &str| {
        repo.get(file)
            .map_err(|e| EmbeddingError::Download(format!("{}: {}", file, e)))
    };

    Ok(ModelFiles {
        config: fetch("config.json")?,
        tokenizer: fetch("tokenizer.json")?,
        weights: fetch("model.safetensors")?,
    })
}
