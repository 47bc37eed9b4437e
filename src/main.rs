//! tap-reddit-ads CLI
//!
//! Singer messages go to stdout, logs to stderr.

use anyhow::Context;
use clap::Parser;
use tap_reddit_ads::cli::{Cli, Runner};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mode = if cli.discover { "discovery" } else { "sync" };

    Runner::new(cli)
        .run()
        .await
        .with_context(|| format!("{mode} failed"))
}
