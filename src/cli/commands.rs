//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Singer tap for the Reddit Ads API
#[derive(Parser, Debug, Clone)]
#[command(name = "tap-reddit-ads")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Run discovery and print the catalog
    #[arg(short, long, conflicts_with_all = ["catalog", "properties"])]
    pub discover: bool,

    /// Catalog file selecting the streams to sync
    #[arg(long, conflicts_with = "properties")]
    pub catalog: Option<PathBuf>,

    /// Catalog file (legacy flag)
    #[arg(short, long)]
    pub properties: Option<PathBuf>,

    /// State file from a previous run
    #[arg(short, long)]
    pub state: Option<PathBuf>,
}

impl Cli {
    /// Catalog path from `--catalog` or `--properties`
    pub fn catalog_path(&self) -> Option<&PathBuf> {
        self.catalog.as_ref().or(self.properties.as_ref())
    }
}
