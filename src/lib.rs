//! # tap-reddit-ads
//!
//! A Singer tap that extracts advertising data from the Reddit Ads API.
//!
//! ## Features
//!
//! - **Incremental reports**: daily report windows resumed from a bookmark,
//!   with a conversion look-back
//! - **Reference streams**: ads, ad groups, campaigns and the account, read in full
//! - **OAuth refresh-token auth**: access tokens cached and renewed on expiry or 401
//! - **Resilient HTTP**: retries with exponential backoff, `Retry-After`, rate limiting
//! - **Singer output**: SCHEMA, RECORD and STATE messages on stdout
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        CLI / Runner                            │
//! │   --discover → Catalog            sync → SyncEngine            │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬────────────┐
//! │   Auth   │   HTTP    │   Extract     │  Schema   │   Output   │
//! ├──────────┼───────────┼───────────────┼───────────┼────────────┤
//! │ Refresh  │ Retry     │ Day windows   │ Transform │ SCHEMA     │
//! │ token    │ Backoff   │ Cursor pages  │ Metadata  │ RECORD     │
//! │ provider │ Rate Limit│ Data envelope │ filtering │ STATE      │
//! └──────────┴───────────┴───────────────┴───────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::float_cmp)]

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// OAuth token provider
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoders
pub mod decode;

/// Stream schemas and record transformation
pub mod schema;

/// Stream definitions
pub mod streams;

/// Catalog discovery and stream selection
pub mod catalog;

/// Replication state and bookmarks
pub mod state;

/// Singer message output
pub mod output;

/// Page extraction and report windows
pub mod extract;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

pub use error::{Error, Result};
pub use types::*;

pub use catalog::{discover, Catalog};
pub use config::TapConfig;
pub use engine::{SyncEngine, SyncStats};
pub use streams::TapStream;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
