//! CLI runner - executes the selected mode

use crate::catalog::{discover, Catalog};
use crate::cli::commands::Cli;
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::output::Emitter;
use crate::state::StateTracker;
use std::io::{BufWriter, Write};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run against stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = BufWriter::new(std::io::stdout());
        self.run_to(stdout).await
    }

    /// Run, writing all output to `out`
    ///
    /// The config is validated before anything else happens, so a bad
    /// config never reaches the network.
    pub async fn run_to<W: Write>(&self, out: W) -> Result<()> {
        let config = TapConfig::from_file(&self.cli.config)?;

        if self.cli.discover {
            self.discover(out)
        } else {
            self.sync(config, out).await
        }
    }

    /// Print the catalog
    fn discover<W: Write>(&self, mut out: W) -> Result<()> {
        info!("Running discovery");
        let catalog = discover()?;
        writeln!(out, "{}", catalog.to_json_pretty()?)?;
        out.flush()?;
        Ok(())
    }

    /// Sync selected streams
    async fn sync<W: Write>(&self, config: TapConfig, out: W) -> Result<()> {
        let catalog = self.load_catalog()?;
        let state = match &self.cli.state {
            Some(path) => StateTracker::from_file(path)?,
            None => StateTracker::in_memory(),
        };

        let mut engine = SyncEngine::from_config(config, state, Emitter::new(out))?;
        engine.sync(&catalog).await?;
        Ok(())
    }

    /// Catalog from the command line, or every discovered stream
    fn load_catalog(&self) -> Result<Catalog> {
        if let Some(path) = self.cli.catalog_path() {
            return Catalog::from_file(path);
        }

        info!("No catalog given, syncing all streams");
        let mut catalog = discover()?;
        catalog.select_all();
        Ok(catalog)
    }
}
