//! The subset of JSON Schema the stream schemas use

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"type": "string"` or `"type": ["null", "string"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    pub fn single(t: JsonType) -> Self {
        Self::Single(t)
    }

    /// `["null", t]`
    pub fn nullable(t: JsonType) -> Self {
        match t {
            JsonType::Null => Self::Single(t),
            _ => Self::Multiple(vec![JsonType::Null, t]),
        }
    }

    /// Declared types in document order
    pub fn types(&self) -> &[JsonType] {
        match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Multiple(types) => types,
        }
    }

    pub fn contains(&self, t: JsonType) -> bool {
        self.types().contains(&t)
    }

    pub fn is_nullable(&self) -> bool {
        self.contains(JsonType::Null)
    }

    /// First non-null type
    pub fn primary_type(&self) -> Option<&JsonType> {
        self.types().iter().find(|t| **t != JsonType::Null)
    }
}

impl Default for JsonTypeOrArray {
    fn default() -> Self {
        Self::Single(JsonType::Object)
    }
}

/// One property of a stream schema, possibly nested
///
/// Keywords the transform does not act on (`anyOf`, `minimum`, ...) are kept
/// in `extra` so a user catalog's schema is emitted as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// `None` accepts any value unchanged
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonTypeOrArray>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Only `date-time` changes how values are transformed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SchemaProperty {
    pub fn new(json_type: JsonType) -> Self {
        Self::typed(JsonTypeOrArray::single(json_type))
    }

    pub fn nullable(json_type: JsonType) -> Self {
        Self::typed(JsonTypeOrArray::nullable(json_type))
    }

    /// Nullable object with the given children
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::nullable(JsonType::Object)
        }
    }

    /// Nullable array of `items`
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::nullable(JsonType::Array)
        }
    }

    fn typed(json_type: JsonTypeOrArray) -> Self {
        Self {
            json_type: Some(json_type),
            description: None,
            format: None,
            properties: None,
            additional_properties: None,
            items: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Declared types, empty when the property has no `type`
    pub fn types(&self) -> &[JsonType] {
        match &self.json_type {
            Some(t) => t.types(),
            None => &[],
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.json_type.as_ref().map_or(true, JsonTypeOrArray::is_nullable)
    }

    pub fn is_object(&self) -> bool {
        self.types().contains(&JsonType::Object)
    }
}

/// Top-level schema of a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type", default)]
    pub json_type: JsonTypeOrArray,

    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Older catalogs select a stream here instead of in metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Empty nullable object that rejects unknown properties
    pub fn new() -> Self {
        Self {
            json_type: JsonTypeOrArray::nullable(JsonType::Object),
            properties: BTreeMap::new(),
            additional_properties: Some(false),
            selected: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::schema("$", format!("invalid schema: {e}")))
    }

    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
