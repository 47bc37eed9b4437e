//! Record transformation against a stream schema
//!
//! Values are coerced to the declared JSON type, properties the schema does
//! not declare are dropped and so are properties deselected in the catalog
//! metadata. The first declared type that accepts a value wins.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Metadata breadcrumb, e.g. `["properties", "targeting", "properties", "devices"]`
pub type Breadcrumb = Vec<String>;

/// Set of breadcrumbs whose values must not be emitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    excluded: HashSet<Breadcrumb>,
}

impl FieldFilter {
    /// Filter that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a breadcrumb
    pub fn exclude(&mut self, breadcrumb: Breadcrumb) {
        self.excluded.insert(breadcrumb);
    }

    /// Check whether a breadcrumb is excluded
    pub fn is_excluded(&self, breadcrumb: &[String]) -> bool {
        self.excluded.contains(breadcrumb)
    }

    /// Number of excluded breadcrumbs
    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    /// True when nothing is excluded
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

/// Transforms raw records to match a schema
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    schema: &'a JsonSchema,
    filter: &'a FieldFilter,
}

impl<'a> Transformer<'a> {
    /// Create a transformer for a schema and field filter
    pub fn new(schema: &'a JsonSchema, filter: &'a FieldFilter) -> Self {
        Self { schema, filter }
    }

    /// Transform one record
    ///
    /// Fails with [`Error::Schema`] when a value cannot be coerced to any of
    /// its declared types.
    pub fn transform(&self, record: &Value) -> Result<Value> {
        let Value::Object(map) = record else {
            return Err(Error::schema(
                "$",
                format!("record must be an object, got {}", kind(record)),
            ));
        };

        let mut breadcrumb = Vec::new();
        let out = self.transform_object(&self.schema.properties, map, &mut breadcrumb, "")?;
        Ok(Value::Object(out))
    }

    fn transform_object(
        &self,
        properties: &BTreeMap<String, SchemaProperty>,
        input: &Map<String, Value>,
        breadcrumb: &mut Breadcrumb,
        path: &str,
    ) -> Result<Map<String, Value>> {
        let mut out = Map::new();

        for (key, value) in input {
            let field_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };

            let Some(property) = properties.get(key) else {
                trace!(field = %field_path, "Dropping property not in schema");
                continue;
            };

            breadcrumb.push("properties".to_string());
            breadcrumb.push(key.clone());

            let result = if self.filter.is_excluded(breadcrumb) {
                trace!(field = %field_path, "Dropping deselected property");
                Ok(None)
            } else {
                self.transform_value(property, value, breadcrumb, &field_path)
                    .map(Some)
            };

            breadcrumb.truncate(breadcrumb.len() - 2);

            if let Some(transformed) = result? {
                out.insert(key.clone(), transformed);
            }
        }

        Ok(out)
    }

    fn transform_value(
        &self,
        property: &SchemaProperty,
        value: &Value,
        breadcrumb: &mut Breadcrumb,
        path: &str,
    ) -> Result<Value> {
        if property.json_type.is_none() {
            return Ok(value.clone());
        }
        if value.is_null() {
            return if property.is_nullable() {
                Ok(Value::Null)
            } else {
                Err(Error::schema(path, "null is not allowed"))
            };
        }

        for json_type in property.types() {
            if let Some(coerced) = self.coerce(*json_type, property, value, breadcrumb, path)? {
                return Ok(coerced);
            }
        }

        let expected: Vec<String> = property
            .types()
            .iter()
            .map(ToString::to_string)
            .collect();
        Err(Error::schema(
            path,
            format!("expected {}, got {}", expected.join(" or "), kind(value)),
        ))
    }

    /// `Ok(None)` means the value does not fit `json_type`; try the next one.
    fn coerce(
        &self,
        json_type: JsonType,
        property: &SchemaProperty,
        value: &Value,
        breadcrumb: &mut Breadcrumb,
        path: &str,
    ) -> Result<Option<Value>> {
        let coerced = match json_type {
            JsonType::Null => None,
            JsonType::Integer => to_integer(value),
            JsonType::Number => to_number(value),
            JsonType::Boolean => to_boolean(value),
            JsonType::String => to_string(value, property.format.as_deref()),
            JsonType::Object => match (value, &property.properties) {
                (Value::Object(map), Some(nested)) => Some(Value::Object(
                    self.transform_object(nested, map, breadcrumb, path)?,
                )),
                (Value::Object(_), None) => Some(value.clone()),
                _ => None,
            },
            JsonType::Array => match (value, &property.items) {
                (Value::Array(items), Some(item_schema)) => {
                    // Array elements carry no selection metadata
                    let mut item_crumb = vec!["items".to_string()];
                    let mut out = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{path}[{i}]");
                        out.push(self.transform_value(
                            item_schema,
                            item,
                            &mut item_crumb,
                            &item_path,
                        )?);
                    }
                    Some(Value::Array(out))
                }
                (Value::Array(_), None) => Some(value.clone()),
                _ => None,
            },
        };
        Ok(coerced)
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        Value::Number(n) => {
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.fract() == 0.0 && in_range).then(|| Value::from(f as i64))
        }
        Value::String(s) => strip_number(s).parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let cleaned = strip_number(s);
            if let Ok(i) = cleaned.parse::<i64>() {
                return Some(Value::from(i));
            }
            let f = cleaned.parse::<f64>().ok()?;
            Number::from_f64(f).map(Value::Number)
        }
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn to_string(value: &Value, format: Option<&str>) -> Option<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if format == Some("date-time") {
        return parse_datetime(&raw)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true)));
    }
    Some(Value::String(raw))
}

/// Parse the timestamp spellings the API uses into UTC
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn strip_number(raw: &str) -> String {
    raw.trim().replace(',', "")
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
