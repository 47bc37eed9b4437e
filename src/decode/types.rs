//! Decoder trait

use crate::error::Result;
use serde_json::Value;

/// Trait for extracting records from a response body
pub trait RecordDecoder: Send + Sync {
    /// Extract the list of records from a parsed response body
    fn decode(&self, body: &Value) -> Result<Vec<Value>>;
}
