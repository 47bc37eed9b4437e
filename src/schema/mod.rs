//! Stream schemas
//!
//! JSON Schema documents describing each stream, plus the record
//! transformer that coerces raw API values to the declared types.

mod transform;
mod types;

pub use transform::{parse_datetime, Breadcrumb, FieldFilter, Transformer};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
