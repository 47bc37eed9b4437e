//! Catalog document types

use crate::error::{Error, Result};
use crate::schema::{Breadcrumb, FieldFilter, JsonSchema};
use crate::streams::TapStream;
use crate::types::{Inclusion, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Metadata
// ============================================================================

/// Metadata attached to a breadcrumb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    #[serde(
        rename = "forced-replication-method",
        skip_serializing_if = "Option::is_none"
    )]
    pub forced_replication_method: Option<ReplicationMethod>,

    #[serde(
        rename = "table-key-properties",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_key_properties: Option<Vec<String>>,

    #[serde(
        rename = "valid-replication-keys",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_replication_keys: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    /// Keys this tap does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl FieldMetadata {
    /// Metadata with only an inclusion
    pub fn with_inclusion(inclusion: Inclusion) -> Self {
        Self {
            inclusion: Some(inclusion),
            ..Default::default()
        }
    }

    /// Whether values at this breadcrumb must be left out of records
    pub fn excludes_field(&self) -> bool {
        match self.inclusion {
            Some(Inclusion::Unsupported) => true,
            Some(Inclusion::Automatic) => false,
            _ => self.selected == Some(false),
        }
    }
}

/// One breadcrumb/metadata pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream itself, `["properties", name, ...]` for fields
    pub breadcrumb: Breadcrumb,
    pub metadata: FieldMetadata,
}

impl MetadataEntry {
    /// Stream-level entry
    pub fn root(metadata: FieldMetadata) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Field-level entry
    pub fn field(path: &[&str], inclusion: Inclusion) -> Self {
        Self {
            breadcrumb: path.iter().map(ToString::to_string).collect(),
            metadata: FieldMetadata::with_inclusion(inclusion),
        }
    }

    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }
}

// ============================================================================
// Catalog Entry
// ============================================================================

/// A stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,

    pub stream: String,

    pub schema: JsonSchema,

    #[serde(default)]
    pub key_properties: Vec<String>,

    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<ReplicationMethod>,
}

impl CatalogEntry {
    /// Stream-level metadata
    pub fn root_metadata(&self) -> Option<&FieldMetadata> {
        self.metadata
            .iter()
            .find(|m| m.is_root())
            .map(|m| &m.metadata)
    }

    fn root_metadata_mut(&mut self) -> &mut FieldMetadata {
        if let Some(idx) = self.metadata.iter().position(MetadataEntry::is_root) {
            &mut self.metadata[idx].metadata
        } else {
            self.metadata.insert(0, MetadataEntry::root(FieldMetadata::default()));
            &mut self.metadata[0].metadata
        }
    }

    /// Selected through root metadata or the legacy schema flag
    pub fn is_selected(&self) -> bool {
        self.root_metadata().and_then(|m| m.selected) == Some(true)
            || self.schema.selected == Some(true)
    }

    /// Mark the stream as selected
    pub fn select(&mut self) {
        self.root_metadata_mut().selected = Some(true);
    }

    /// Breadcrumbs whose values must be dropped from records
    pub fn field_filter(&self) -> FieldFilter {
        let mut filter = FieldFilter::new();
        for entry in self.metadata.iter().filter(|m| !m.is_root()) {
            if entry.metadata.excludes_field() {
                filter.exclude(entry.breadcrumb.clone());
            }
        }
        filter
    }

    /// Resolve the stream this entry describes
    pub fn tap_stream(&self) -> Result<TapStream> {
        self.tap_stream_id.parse()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog document (`--catalog` / `--properties` / discovery output)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog(format!("Invalid catalog: {e}")))
    }

    /// Look up an entry by `tap_stream_id`
    pub fn get_stream(&self, tap_stream_id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == tap_stream_id)
    }

    /// Select every stream
    pub fn select_all(&mut self) {
        for entry in &mut self.streams {
            entry.select();
        }
    }

    /// Selected streams, rotated so an interrupted stream resumes first
    pub fn selected_streams(&self, currently_syncing: Option<&str>) -> Vec<&CatalogEntry> {
        let start = currently_syncing
            .and_then(|name| self.streams.iter().position(|s| s.tap_stream_id == name))
            .unwrap_or(0);

        self.streams[start..]
            .iter()
            .chain(&self.streams[..start])
            .filter(|s| s.is_selected())
            .collect()
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
