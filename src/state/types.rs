//! State document types
//!
//! These types are serialized into STATE messages and read back from the
//! `--state` file on the next run.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete tap state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,

    /// Stream that was in progress when the state was written
    #[serde(default)]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Get mutable bookmark for a stream, creating if needed
    pub fn get_bookmark_mut(&mut self, stream: &str) -> &mut Bookmark {
        self.bookmarks.entry(stream.to_string()).or_default()
    }
}

/// Bookmark of a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Last synced report date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Keys written by other versions of the tap
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}
