//! Shared types: JSON aliases and the small enums that appear in catalog
//! metadata and client settings.

use serde::{Deserialize, Serialize};

pub type JsonValue = serde_json::Value;

pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Singer `forced-replication-method`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Every run reads the whole collection
    #[default]
    FullTable,
    /// Runs resume from the stream's bookmark
    Incremental,
}

impl ReplicationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTable => "FULL_TABLE",
            Self::Incremental => "INCREMENTAL",
        }
    }
}

/// Singer `inclusion` of a stream or field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Emitted regardless of selection (key properties)
    Automatic,
    /// Emitted unless deselected
    #[default]
    Available,
    /// Never emitted
    Unsupported,
}

/// Growth of the delay between HTTP retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    Constant,
    Linear,
    #[default]
    Exponential,
}
