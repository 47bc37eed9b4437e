//! CLI module
//!
//! Singer-style command-line interface.
//!
//! # Modes
//!
//! - `--discover` - Print the catalog of available streams
//! - default - Sync the streams selected in `--catalog` (all streams when no
//!   catalog is given), resuming from `--state`

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
