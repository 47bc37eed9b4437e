//! Execution engine module
//!
//! Drives a sync run: streams selected in the catalog are extracted one at
//! a time, records are transformed against the stream schema and written
//! out, and state checkpoints follow the records they cover.
//!
//! # Overview
//!
//! - `SyncEngine` - Orchestrates extraction, transformation and checkpointing
//! - `SyncStats` - Counters logged at the end of each stream and run

mod types;

pub use types::{SyncStats, WindowTally};

use crate::auth::{OAuthCredentials, RefreshTokenProvider};
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::{parse_date, TapConfig};
use crate::error::Result;
use crate::extract::Extractor;
use crate::http::HttpClient;
use crate::output::Emitter;
use crate::schema::Transformer;
use crate::state::StateTracker;
use crate::streams::TapStream;
use crate::types::{JsonValue, ReplicationMethod};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<W: Write> {
    /// Page source
    extractor: Extractor,
    /// Bookmarks
    state: StateTracker,
    /// Message sink
    emitter: Emitter<W>,
    /// Statistics
    stats: SyncStats,
    /// Reference date for report windows
    today: NaiveDate,
}

impl<W: Write> SyncEngine<W> {
    /// Create a new sync engine
    pub fn new(extractor: Extractor, state: StateTracker, emitter: Emitter<W>) -> Self {
        Self {
            extractor,
            state,
            emitter,
            stats: SyncStats::default(),
            today: Utc::now().date_naive(),
        }
    }

    /// Build the production engine: refresh-token auth and the configured
    /// retry and rate-limit policy
    pub fn from_config(config: TapConfig, state: StateTracker, emitter: Emitter<W>) -> Result<Self> {
        let provider = Arc::new(RefreshTokenProvider::new(OAuthCredentials::from_config(
            &config,
        )));
        let client = HttpClient::with_auth(config.http_config(), provider)?;
        Ok(Self::new(Extractor::new(client, config), state, emitter))
    }

    /// Override the reference date used for report windows
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Get the state tracker
    pub fn state(&self) -> &StateTracker {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Give back the message sink
    pub fn into_emitter(self) -> Emitter<W> {
        self.emitter
    }

    /// Sync every selected stream in the catalog
    ///
    /// A final state message closes the run unless the last checkpoint
    /// already carries the current state.
    pub async fn sync(&mut self, catalog: &Catalog) -> Result<SyncStats> {
        let start = Instant::now();
        let resume = self.state.currently_syncing().map(ToString::to_string);
        let selected = catalog.selected_streams(resume.as_deref());

        if selected.is_empty() {
            warn!("No streams selected");
        }

        for entry in selected {
            info!("Syncing stream: {}", entry.tap_stream_id);
            self.sync_stream(entry).await?;
        }

        if self.state.is_dirty() || self.emitter.states_written() == 0 {
            self.checkpoint()?;
        }
        self.emitter.flush()?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Sync complete: {} records, {} skipped, {} pages, {} streams in {}ms",
            self.stats.records_synced,
            self.stats.records_skipped,
            self.stats.pages_fetched,
            self.stats.streams_synced,
            self.stats.duration_ms
        );
        Ok(self.stats.clone())
    }

    /// Sync a single catalog entry
    pub async fn sync_stream(&mut self, entry: &CatalogEntry) -> Result<()> {
        let stream = entry.tap_stream()?;
        let bookmark_properties: Vec<String> =
            stream.replication_key().map(ToString::to_string).into_iter().collect();

        self.emitter.write_schema(
            &entry.tap_stream_id,
            &entry.schema,
            &entry.key_properties,
            &bookmark_properties,
        )?;

        match stream.replication_method() {
            ReplicationMethod::Incremental => self.sync_incremental(entry, stream).await?,
            ReplicationMethod::FullTable => self.sync_full_table(entry, stream).await?,
        }

        // full-table streams have no bookmark but still close with a checkpoint
        self.state.set_currently_syncing(None);
        if self.state.is_dirty() || stream.replication_method() == ReplicationMethod::FullTable {
            self.checkpoint()?;
        }
        self.stats.add_stream();
        Ok(())
    }

    /// Report days, checkpointed after every day that produced records
    async fn sync_incremental(&mut self, entry: &CatalogEntry, stream: TapStream) -> Result<()> {
        let name = entry.tap_stream_id.as_str();
        let replication_key = stream.replication_key();
        let bookmark = self.state.bookmark(name);
        if let Some(bookmark) = bookmark {
            info!(stream = name, "Resuming from bookmark {bookmark}");
        }

        let filter = entry.field_filter();
        let transformer = Transformer::new(&entry.schema, &filter);
        let mut pages = self.extractor.fetch(stream, bookmark, self.today);
        let mut tally = WindowTally::default();

        while let Some(page) = pages.try_next().await? {
            self.stats.add_page();
            emit_records(
                &mut self.emitter,
                &transformer,
                name,
                replication_key,
                page.records,
                &mut tally,
            )?;

            if !page.last_in_window {
                continue;
            }

            self.stats.add_window(&tally);
            if let Some(new_bookmark) = page.window.and_then(|day| tally.bookmark(day)) {
                debug!(stream = name, "Window complete with {} records", tally.records);
                if self.state.advance(name, new_bookmark) {
                    self.emitter.write_state(&self.state.snapshot())?;
                    self.state.mark_emitted();
                    self.stats.add_checkpoint();
                }
            }
            tally = WindowTally::default();
        }

        Ok(())
    }

    /// Whole collection; `sync_stream` checkpoints once it is done
    async fn sync_full_table(&mut self, entry: &CatalogEntry, stream: TapStream) -> Result<()> {
        let name = entry.tap_stream_id.as_str();
        let filter = entry.field_filter();
        let transformer = Transformer::new(&entry.schema, &filter);
        let mut pages = self.extractor.fetch(stream, None, self.today);
        let mut tally = WindowTally::default();

        while let Some(page) = pages.try_next().await? {
            self.stats.add_page();
            emit_records(
                &mut self.emitter,
                &transformer,
                name,
                None,
                page.records,
                &mut tally,
            )?;
        }

        info!(
            stream = name,
            "Emitted {} records ({} skipped)", tally.records, tally.skipped
        );
        self.stats.add_window(&tally);
        Ok(())
    }

    /// Emit the current state
    fn checkpoint(&mut self) -> Result<()> {
        self.emitter.write_state(&self.state.snapshot())?;
        self.state.mark_emitted();
        self.stats.add_checkpoint();
        Ok(())
    }
}

/// Transform and write one page of records
///
/// Records that fail the schema are logged and skipped.
fn emit_records<W: Write>(
    emitter: &mut Emitter<W>,
    transformer: &Transformer<'_>,
    stream: &str,
    replication_key: Option<&str>,
    records: Vec<JsonValue>,
    tally: &mut WindowTally,
) -> Result<()> {
    for raw in records {
        let record = match transformer.transform(&raw) {
            Ok(record) => record,
            Err(e) if e.is_record_level() => {
                warn!(stream, "Skipping record: {e}");
                tally.skip();
                continue;
            }
            Err(e) => return Err(e),
        };

        let date = replication_key
            .and_then(|key| record.get(key))
            .and_then(JsonValue::as_str)
            .and_then(parse_date);
        emitter.write_record(stream, record)?;
        tally.observe(date);
    }
    Ok(())
}
