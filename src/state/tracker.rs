//! Bookmark tracking
//!
//! The tracker owns the state for the whole run. Bookmarks only move
//! forward; a checkpoint is pending whenever the state changed since the
//! last emitted snapshot.

use super::types::State;
use crate::config::parse_date;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, warn};

/// Date format written into bookmarks
const BOOKMARK_FORMAT: &str = "%Y-%m-%d";

/// Tracks replication state during a run
#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    /// Current state
    state: State,
    /// Changed since the last snapshot was emitted
    dirty: bool,
}

impl StateTracker {
    /// Wrap an existing state
    pub fn new(state: State) -> Self {
        Self {
            state,
            dirty: false,
        }
    }

    /// Tracker starting from empty state
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load prior state from a `--state` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        Self::from_json(&contents)
    }

    /// Parse prior state from a JSON string
    ///
    /// An empty document (`{}` or blank) is an empty state.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::in_memory());
        }
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::new(state))
    }

    /// Current bookmark of a stream, tolerating timestamp suffixes
    pub fn bookmark(&self, stream: &str) -> Option<NaiveDate> {
        let raw = self.state.get_bookmark(stream)?.date.as_deref()?;
        let parsed = parse_date(raw);
        if parsed.is_none() {
            warn!(stream, bookmark = raw, "Ignoring unparseable bookmark");
        }
        parsed
    }

    /// Move a stream's bookmark forward
    ///
    /// Returns `true` when the bookmark changed. Values not greater than the
    /// current bookmark are ignored.
    pub fn advance(&mut self, stream: &str, new_value: NaiveDate) -> bool {
        if self.bookmark(stream).is_some_and(|current| current >= new_value) {
            return false;
        }

        debug!(stream, bookmark = %new_value, "Advancing bookmark");
        self.state.get_bookmark_mut(stream).date =
            Some(new_value.format(BOOKMARK_FORMAT).to_string());
        self.dirty = true;
        true
    }

    /// Stream recorded as in progress
    pub fn currently_syncing(&self) -> Option<&str> {
        self.state.currently_syncing.as_deref()
    }

    /// Record which stream is in progress
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        if self.currently_syncing() != stream {
            self.state.currently_syncing = stream.map(ToString::to_string);
            self.dirty = true;
        }
    }

    /// Full state document
    pub fn snapshot(&self) -> State {
        self.state.clone()
    }

    /// True when the state changed since the last emitted snapshot
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current snapshot has been emitted
    pub fn mark_emitted(&mut self) {
        self.dirty = false;
    }
}
