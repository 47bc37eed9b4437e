//! Catalog discovery

use super::types::{Catalog, CatalogEntry, FieldMetadata, MetadataEntry};
use crate::error::Result;
use crate::schema::JsonSchema;
use crate::streams::TapStream;
use crate::types::Inclusion;
use tracing::debug;

/// Build the catalog of every stream the tap supports
pub fn discover() -> Result<Catalog> {
    let streams = TapStream::ALL
        .into_iter()
        .map(discover_stream)
        .collect::<Result<Vec<_>>>()?;

    debug!("Discovered {} streams", streams.len());
    Ok(Catalog { streams })
}

fn discover_stream(stream: TapStream) -> Result<CatalogEntry> {
    let schema = stream.schema()?;
    let metadata = create_metadata(stream, &schema);

    Ok(CatalogEntry {
        tap_stream_id: stream.name().to_string(),
        stream: stream.name().to_string(),
        key_properties: stream
            .key_properties()
            .iter()
            .map(ToString::to_string)
            .collect(),
        schema,
        metadata,
        replication_key: None,
        replication_method: None,
    })
}

/// Stream metadata plus one entry per field
///
/// Object-typed properties are described through their nested fields only.
pub fn create_metadata(stream: TapStream, schema: &JsonSchema) -> Vec<MetadataEntry> {
    let keys = stream.key_properties();

    let root = FieldMetadata {
        inclusion: Some(Inclusion::Available),
        forced_replication_method: Some(stream.replication_method()),
        table_key_properties: Some(keys.iter().map(ToString::to_string).collect()),
        valid_replication_keys: stream.replication_key().map(|k| vec![k.to_string()]),
        ..Default::default()
    };

    let mut entries = vec![MetadataEntry::root(root)];

    for (name, property) in &schema.properties {
        match (&property.properties, property.is_object()) {
            (Some(nested), true) => {
                entries.extend(nested.keys().map(|child| {
                    MetadataEntry::field(
                        &["properties", name.as_str(), "properties", child.as_str()],
                        Inclusion::Available,
                    )
                }));
            }
            _ => {
                let inclusion = if keys.contains(&name.as_str()) {
                    Inclusion::Automatic
                } else {
                    Inclusion::Available
                };
                entries.push(MetadataEntry::field(&["properties", name.as_str()], inclusion));
            }
        }
    }

    entries
}
