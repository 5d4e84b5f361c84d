//! Configuration loading for searchme.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config_dir>/searchme/config.toml`.
//!
//! Nothing below the binary reads the environment: the record store is
//! handed an explicit index directory taken from these settings.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TypesError;

const APP_NAME: &str = "searchme";

/// Embedding model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// HuggingFace repository of the sentence-embedding model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Where downloaded model files are cached
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_model_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.cache_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from("./.cache/models"))
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            cache_dir: default_model_cache_dir(),
        }
    }
}

/// Directory walk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSettings {
    /// Skip files and directories whose name starts with a dot
    #[serde(default)]
    pub skip_hidden: bool,

    /// Upper bound on bytes read for text content of a single file
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: u64,

    /// Log a progress line every N files
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_max_text_bytes() -> u64 {
    8 * 1024 * 1024
}

fn default_progress_every() -> usize {
    100
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            max_text_bytes: default_max_text_bytes(),
            progress_every: default_progress_every(),
        }
    }
}

/// Query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Number of results when the query gives none
    #[serde(default = "default_results")]
    pub default_results: usize,
}

fn default_results() -> usize {
    5
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_results: default_results(),
        }
    }
}

/// LLM summarizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// When false, results are always printed as a plain listing
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model name passed to the generate endpoint
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Ollama-compatible generate endpoint
    #[serde(default = "default_summarizer_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_summarizer_retries")]
    pub max_retries: u32,
}

fn default_true() -> bool {
    true
}

fn default_summarizer_model() -> String {
    "mistral".to_string()
}

fn default_summarizer_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_summarizer_timeout() -> u64 {
    10
}

fn default_summarizer_retries() -> u32 {
    2
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_summarizer_model(),
            endpoint: default_summarizer_endpoint(),
            timeout_secs: default_summarizer_timeout(),
            max_retries: default_summarizer_retries(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the vector index and both mapping files
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub indexing: IndexingSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub summarizer: SummarizerSettings,
}

fn default_index_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./.searchme-index"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            log_level: default_log_level(),
            embedding: EmbeddingSettings::default(),
            indexing: IndexingSettings::default(),
            search: SearchSettings::default(),
            summarizer: SummarizerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`<config_dir>/searchme/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`SEARCHME_*`, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&Path>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_dir", default_index_dir().to_string_lossy().to_string())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // e.g. SEARCHME_INDEX_DIR, SEARCHME_SUMMARIZER__MODEL
        builder = builder.add_source(
            Environment::with_prefix("SEARCHME")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))
    }

    /// Index directory with a leading `~/` expanded to the home directory.
    pub fn expanded_index_dir(&self) -> PathBuf {
        expand_home(&self.index_dir)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.search.default_results, 5);
        assert_eq!(settings.summarizer.model, "mistral");
        assert_eq!(settings.summarizer.timeout_secs, 10);
        assert!(settings.summarizer.enabled);
        assert!(!settings.indexing.skip_hidden);
        assert!(settings.index_dir.ends_with("index"));
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.search.default_results, 5);
    }

    #[test]
    fn test_cli_config_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "index_dir = \"/srv/searchme\"\n\n[summarizer]\nmodel = \"llama3\"\n\n[indexing]\nskip_hidden = true"
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.index_dir, PathBuf::from("/srv/searchme"));
        assert_eq!(settings.summarizer.model, "llama3");
        assert_eq!(settings.summarizer.endpoint, default_summarizer_endpoint());
        assert!(settings.indexing.skip_hidden);
    }

    #[test]
    fn test_missing_cli_config_is_an_error() {
        let result = Settings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(TypesError::Config(_))));
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home(Path::new("~/.file_search_index"));
        assert!(expanded.ends_with(".file_search_index"));
        assert_ne!(expanded, PathBuf::from("~/.file_search_index"));

        let absolute = expand_home(Path::new("/var/lib/searchme"));
        assert_eq!(absolute, PathBuf::from("/var/lib/searchme"));
    }
}
