//! Command implementations for `searchme`.
//!
//! Handles:
//! - index: load any saved index, walk the requested paths, save
//! - query: embed the query, search, answer via the language model or a listing
//! - status: report what the saved index holds

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use tokio::{signal, task};
use tracing::{debug, info, warn};

use searchme_embeddings::{CandleEmbedder, EmbeddingModel, ModelCache};
use searchme_extract::FileExtractor;
use searchme_indexing::{
    format_size, scan_paths, IndexingEngine, LoggingProgressCallback, NoOpProgressCallback,
    ProgressCallback, SkipPolicy,
};
use searchme_retrieval::{QueryEngine, QueryError, SearchHit};
use searchme_summarizer::{fallback_listing, respond, OllamaConfig, OllamaSummarizer};
use searchme_types::Settings;
use searchme_vector::{RecordStore, StoreConfig, StoreError, StoreStats};

use crate::cli::IndexTarget;

/// Printed when a query finds nothing to search.
pub const NO_INDEX_GUIDANCE: &str =
    "No index found. Index some files first, e.g. `searchme index --directory ~/Documents`.";

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(config_path: Option<&Path>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn store_config(settings: &Settings) -> StoreConfig {
    StoreConfig::new(settings.expanded_index_dir())
}

/// Base paths for an index run.
pub fn resolve_roots(target: &IndexTarget) -> Result<Vec<PathBuf>> {
    if let Some(dir) = &target.directory {
        if !dir.is_dir() {
            bail!("Not a directory: {}", dir.display());
        }
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", dir.display()))?;
        return Ok(vec![dir]);
    }

    if target.home {
        let home = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .context("Could not determine the home directory")?;
        return Ok(vec![home]);
    }

    if target.system {
        ensure_root()?;
        return Ok(vec![PathBuf::from("/")]);
    }

    bail!("Nothing to index: pass --directory, --home or --system")
}

#[cfg(unix)]
fn ensure_root() -> Result<()> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    if unsafe { libc::geteuid() } != 0 {
        bail!("--system requires root privileges; rerun with sudo");
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_root() -> Result<()> {
    bail!("--system is only supported on Unix")
}

async fn load_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingModel>> {
    let cache = ModelCache::from_settings(&settings.embedding);
    info!(model = cache.model_name(), "Loading embedding model");
    let embedder = task::spawn_blocking(move || CandleEmbedder::load(&cache))
        .await
        .context("Embedding model loader panicked")?
        .context("Failed to load embedding model")?;
    Ok(Arc::new(embedder))
}

/// Load the saved index if there is one.
///
/// A missing index is normal on first use. An unreadable one is reported
/// and replaced by an empty store.
fn open_store(config: StoreConfig) -> RecordStore {
    let mut store = RecordStore::new(config);
    match store.load() {
        Ok(vectors) => debug!(vectors, "Opened saved index"),
        Err(StoreError::MissingArtifacts(_)) => debug!("No saved index"),
        Err(e) => warn!(error = %e, "Saved index is unusable; starting from an empty index"),
    }
    store
}

/// Index the requested paths and save the result.
pub async fn run_index(
    settings: &Settings,
    target: &IndexTarget,
    quiet: bool,
    skip_hidden: bool,
) -> Result<()> {
    let roots = resolve_roots(target)?;
    let config = store_config(settings);
    fs::create_dir_all(&config.index_dir).with_context(|| {
        format!(
            "Failed to create index directory {}",
            config.index_dir.display()
        )
    })?;

    let store = open_store(config);
    if !store.is_empty() {
        println!("Appending to existing index ({} vectors)", store.len());
    }

    let policy = SkipPolicy::new(skip_hidden || settings.indexing.skip_hidden);

    let total = if quiet {
        None
    } else {
        let roots = roots.clone();
        let policy = policy.clone();
        let totals = task::spawn_blocking(move || scan_paths(&roots, &policy))
            .await
            .context("Pre-scan panicked")?;
        println!(
            "Found {} files ({}) to index",
            totals.files,
            format_size(totals.bytes as f64)
        );
        Some(totals.files)
    };

    let embedder = load_embedder(settings).await?;
    let extractor = Arc::new(FileExtractor::new(settings.indexing.max_text_bytes));
    let cancel = Arc::new(AtomicBool::new(false));
    let mut engine = IndexingEngine::new(extractor, embedder, store)
        .with_skip_policy(policy)
        .with_cancel_flag(Arc::clone(&cancel));

    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current file");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let progress: Box<dyn ProgressCallback> = match total {
        Some(total) => Box::new(
            LoggingProgressCallback::new(settings.indexing.progress_every).with_total(total),
        ),
        None => Box::new(NoOpProgressCallback),
    };

    let (engine, outcome) = task::spawn_blocking(move || {
        let outcome = engine.index_paths(&roots, progress.as_ref());
        (engine, outcome)
    })
    .await
    .context("Indexing task panicked")?;
    interrupt.abort();

    // Records committed before a fatal error are still worth keeping.
    let store = engine.into_store();
    let stats = match outcome {
        Ok(stats) => stats,
        Err(e) => {
            if let Err(save_err) = store.save() {
                warn!(error = %save_err, "Could not save partial index");
            }
            return Err(e).context("Indexing aborted");
        }
    };

    println!("\n{}", stats);

    match store.save() {
        Ok(vectors) => {
            println!(
                "\nIndex saved to {} ({} vectors)",
                store.config().index_dir.display(),
                vectors
            );
            Ok(())
        }
        Err(StoreError::Empty) => {
            println!("\nNothing was indexed; no index written");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to save index"),
    }
}

/// Search the saved index and print an answer.
pub async fn run_query(
    settings: &Settings,
    text: &str,
    results: Option<usize>,
    no_llm: bool,
    json: bool,
) -> Result<()> {
    let k = results.unwrap_or(settings.search.default_results);
    let store = open_store(store_config(settings));
    if store.is_empty() {
        println!("{}", NO_INDEX_GUIDANCE);
        return Ok(());
    }

    let embedder = load_embedder(settings).await?;
    let query = text.to_string();
    let searched = task::spawn_blocking(move || {
        QueryEngine::new(embedder, &store).search(&query, k)
    })
    .await
    .context("Search task panicked")?;

    let hits: Vec<SearchHit> = match searched {
        Ok(hits) => hits,
        Err(QueryError::NoIndex) => {
            println!("{}", NO_INDEX_GUIDANCE);
            return Ok(());
        }
        Err(e) => return Err(e).context("Search failed"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    let answer = if no_llm || !settings.summarizer.enabled {
        fallback_listing(&hits)
    } else {
        let summarizer = OllamaSummarizer::new(OllamaConfig::from_settings(&settings.summarizer))
            .context("Failed to configure summarizer")?;
        respond(&summarizer, text, &hits).await
    };

    println!("{}", answer);
    Ok(())
}

/// Print what the saved index holds.
pub fn show_status(settings: &Settings, json: bool) -> Result<()> {
    let config = store_config(settings);
    let mut store: RecordStore = RecordStore::new(config.clone());

    let loaded = store.load();
    let stats = store.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    match loaded {
        Ok(_) => println!("{}", render_status(&stats)),
        Err(StoreError::MissingArtifacts(_)) => {
            println!("No index at {}", config.index_dir.display());
        }
        Err(e) => {
            println!("Index at {} is unusable: {}", config.index_dir.display(), e);
        }
    }
    Ok(())
}

/// Plain-text rendering of [`StoreStats`].
pub fn render_status(stats: &StoreStats) -> String {
    let dimension = stats
        .dimension
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Index directory: {}\nVectors: {}\nFiles: {}\nDimension: {}\nSize on disk: {}",
        stats.index_dir.display(),
        stats.vectors,
        stats.distinct_files,
        dimension,
        format_size(stats.artifact_bytes as f64)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target_dir(dir: &Path) -> IndexTarget {
        IndexTarget {
            directory: Some(dir.to_path_buf()),
            home: false,
            system: false,
        }
    }

    #[test]
    fn test_resolve_directory_is_absolute() {
        let dir = TempDir::new().unwrap();
        let roots = resolve_roots(&target_dir(dir.path())).unwrap();
        assert_eq!(roots.len(), 1);
        assert!(roots[0].is_absolute());
        assert_eq!(roots[0], dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolve_roots(&target_dir(&dir.path().join("gone"))).unwrap_err();
        assert!(err.to_string().contains("Not a directory"));
    }

    #[test]
    fn test_resolve_home() {
        let target = IndexTarget {
            directory: None,
            home: true,
            system: false,
        };
        let roots = resolve_roots(&target).unwrap();
        assert_eq!(roots.len(), 1);
        assert!(roots[0].is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_system_checks_privileges() {
        let target = IndexTarget {
            directory: None,
            home: false,
            system: true,
        };
        let is_root = unsafe { libc::geteuid() } == 0;
        match resolve_roots(&target) {
            Ok(roots) => {
                assert!(is_root);
                assert_eq!(roots, vec![PathBuf::from("/")]);
            }
            Err(e) => {
                assert!(!is_root);
                assert!(e.to_string().contains("root"));
            }
        }
    }

    #[test]
    fn test_log_level_override() {
        let settings = load_settings(None, Some("trace")).unwrap();
        assert_eq!(settings.log_level, "trace");
    }

    #[test]
    fn test_status_of_missing_index() {
        let dir = TempDir::new().unwrap();
        let store = open_store(StoreConfig::new(dir.path()));
        assert!(store.is_empty());

        let rendered = render_status(&store.stats());
        assert!(rendered.contains("Vectors: 0"));
        assert!(rendered.contains("Dimension: -"));
        assert!(rendered.contains("Size on disk: 0.00 B"));
    }
}
