//! CLI argument parsing for `searchme`.
//!
//! CLI flags override every other config source.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Semantic file search
///
/// Index files by their metadata and content, then find them with
/// natural-language queries.
#[derive(Parser, Debug)]
#[command(name = "searchme")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides the default in the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index files, appending to any existing index
    Index {
        #[command(flatten)]
        target: IndexTarget,

        /// Skip the pre-scan and per-file progress lines
        #[arg(short, long)]
        quiet: bool,

        /// Skip files and directories whose name starts with a dot
        #[arg(long)]
        skip_hidden: bool,
    },

    /// Search the index
    Query {
        /// What to look for
        text: String,

        /// Number of results (default from config)
        #[arg(short = 'k', long = "results")]
        results: Option<usize>,

        /// Print the plain result listing instead of asking the language model
        #[arg(long)]
        no_llm: bool,

        /// Print raw hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the saved index contains
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// What to index. Exactly one must be given.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct IndexTarget {
    /// Index a single directory tree
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Index the current user's home directory
    #[arg(long)]
    pub home: bool,

    /// Index the whole filesystem (requires root)
    #[arg(long)]
    pub system: bool,
}
