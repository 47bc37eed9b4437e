use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

/// Records at a fixed location in a JSON body
///
/// An array yields its items, an object yields itself, and null or a
/// missing member yields nothing. Any other value is a decode error.
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// JSON pointer to the records; empty means the whole body
    pointer: String,
}

impl JsonDecoder {
    /// Records are the body itself
    pub fn new() -> Self {
        Self::default()
    }

    /// Records under a dotted path such as `data` or `$.result.items`
    pub fn with_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let dotted = path.strip_prefix("$.").unwrap_or(&path);
        let pointer = dotted
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| format!("/{}", part.replace('~', "~0").replace('/', "~1")))
            .collect();
        Self { pointer }
    }

    /// The Ads API `data` envelope
    pub fn data_envelope() -> Self {
        Self::with_path("data")
    }

    fn location(&self) -> &str {
        if self.pointer.is_empty() {
            "$"
        } else {
            &self.pointer
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &Value) -> Result<Vec<Value>> {
        match body.pointer(&self.pointer) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(object @ Value::Object(_)) => Ok(vec![object.clone()]),
            Some(other) => Err(Error::decode(format!(
                "Expected records at '{}', found {}",
                self.location(),
                describe(other)
            ))),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
