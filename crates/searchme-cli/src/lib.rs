//! `searchme` command-line front end.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (index, query, status)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, IndexTarget};
pub use commands::{
    init_logging, load_settings, render_status, resolve_roots, run_index, run_query, show_status,
    NO_INDEX_GUIDANCE,
};
