//! Engine types
//!
//! Run statistics for the sync engine.

use chrono::NaiveDate;

/// Statistics from a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted
    pub records_synced: u64,
    /// Records dropped because they did not match the schema
    pub records_skipped: u64,
    /// Pages fetched
    pub pages_fetched: u64,
    /// Streams completed
    pub streams_synced: u64,
    /// State messages emitted
    pub checkpoints: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a checkpoint
    pub fn add_checkpoint(&mut self) {
        self.checkpoints += 1;
    }

    /// Fold a window's tally into the totals
    pub fn add_window(&mut self, tally: &WindowTally) {
        self.records_synced += tally.records;
        self.records_skipped += tally.skipped;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Records seen within one report day, or a whole full-table stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowTally {
    /// Records emitted
    pub records: u64,
    /// Records skipped
    pub skipped: u64,
    /// Greatest replication key value emitted
    pub max_date: Option<NaiveDate>,
}

impl WindowTally {
    /// Record an emitted record and its replication key value
    pub fn observe(&mut self, date: Option<NaiveDate>) {
        self.records += 1;
        if let Some(date) = date {
            self.max_date = Some(self.max_date.map_or(date, |current| current.max(date)));
        }
    }

    /// Record a skipped record
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Bookmark for a completed window
    ///
    /// The later of the window day and the greatest date observed, or
    /// `None` when the window emitted nothing.
    pub fn bookmark(&self, window: NaiveDate) -> Option<NaiveDate> {
        (self.records > 0).then(|| self.max_date.map_or(window, |max| max.max(window)))
    }
}
