//! searchme
//!
//! Semantic search over local files.
//!
//! # Usage
//!
//! ```bash
//! searchme index (--directory DIR | --home | --system) [--quiet] [--skip-hidden]
//! searchme query "TEXT" [-k N] [--no-llm] [--json]
//! searchme status [--json]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (e.g. ~/.config/searchme/config.toml)
//! 3. `--config` file
//! 4. Environment variables (SEARCHME_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use searchme_cli::{init_logging, load_settings, run_index, run_query, show_status, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Index {
            target,
            quiet,
            skip_hidden,
        } => {
            run_index(&settings, &target, quiet, skip_hidden).await?;
        }
        Commands::Query {
            text,
            results,
            no_llm,
            json,
        } => {
            run_query(&settings, &text, results, no_llm, json).await?;
        }
        Commands::Status { json } => {
            show_status(&settings, json)?;
        }
    }

    Ok(())
}
