//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ads platform sync connector CLI
#[derive(Parser, Debug)]
#[command(name = "adsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Catalog file (JSON) with stream selection annotations
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover available streams and print the catalog
    Discover,

    /// Sync selected streams to stdout
    Sync {
        /// Streams to sync (comma-separated, overrides catalog selection)
        #[arg(long)]
        streams: Option<String>,
    },
}
