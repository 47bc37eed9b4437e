//! Tests for catalog discovery and selection

use super::*;
use crate::error::Error;
use crate::streams::TapStream;
use crate::types::{Inclusion, ReplicationMethod};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn crumb(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

fn find<'a>(entry: &'a CatalogEntry, parts: &[&str]) -> Option<&'a FieldMetadata> {
    let target = crumb(parts);
    entry
        .metadata
        .iter()
        .find(|m| m.breadcrumb == target)
        .map(|m| &m.metadata)
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discover_lists_every_stream() {
    let catalog = discover().unwrap();
    let names: Vec<&str> = catalog
        .streams
        .iter()
        .map(|s| s.tap_stream_id.as_str())
        .collect();

    assert_eq!(names, vec!["ads_reports", "ads", "campaigns", "ad_groups", "accounts"]);
    for entry in &catalog.streams {
        assert_eq!(entry.stream, entry.tap_stream_id);
        assert!(!entry.is_selected());
    }
}

#[test]
fn test_report_root_metadata() {
    let catalog = discover().unwrap();
    let reports = catalog.get_stream("ads_reports").unwrap();
    let root = reports.root_metadata().unwrap();

    assert_eq!(root.inclusion, Some(Inclusion::Available));
    assert_eq!(
        root.forced_replication_method,
        Some(ReplicationMethod::Incremental)
    );
    assert_eq!(root.valid_replication_keys, Some(vec!["date".to_string()]));
    assert_eq!(
        reports.key_properties,
        vec!["date", "account_id", "campaign_id", "ad_group_id", "ad_id"]
    );
}

#[test]
fn test_full_table_root_metadata() {
    let catalog = discover().unwrap();
    let ads = catalog.get_stream("ads").unwrap();
    let root = ads.root_metadata().unwrap();

    assert_eq!(root.forced_replication_method, Some(ReplicationMethod::FullTable));
    assert_eq!(root.table_key_properties, Some(vec!["id".to_string()]));
    assert_eq!(root.valid_replication_keys, None);
}

#[test]
fn test_field_inclusion() {
    let catalog = discover().unwrap();
    let reports = catalog.get_stream("ads_reports").unwrap();

    assert_eq!(
        find(reports, &["properties", "ad_id"]).unwrap().inclusion,
        Some(Inclusion::Automatic)
    );
    assert_eq!(
        find(reports, &["properties", "impressions"]).unwrap().inclusion,
        Some(Inclusion::Available)
    );
}

#[test]
fn test_object_properties_use_nested_breadcrumbs() {
    let catalog = discover().unwrap();
    let ad_groups = catalog.get_stream("ad_groups").unwrap();

    assert!(find(ad_groups, &["properties", "targeting"]).is_none());
    assert_eq!(
        find(ad_groups, &["properties", "targeting", "properties", "devices"])
            .unwrap()
            .inclusion,
        Some(Inclusion::Available)
    );
}

#[test]
fn test_metadata_serializes_singer_keys() {
    let schema = TapStream::AdsReports.schema().unwrap();
    let metadata = create_metadata(TapStream::AdsReports, &schema);
    let root = serde_json::to_value(&metadata[0]).unwrap();

    assert_eq!(
        root,
        json!({
            "breadcrumb": [],
            "metadata": {
                "inclusion": "available",
                "forced-replication-method": "INCREMENTAL",
                "table-key-properties": ["date", "account_id", "campaign_id", "ad_group_id", "ad_id"],
                "valid-replication-keys": ["date"]
            }
        })
    );
}

// ============================================================================
// Selection
// ============================================================================

fn catalog_with(selected: &[&str]) -> Catalog {
    let mut catalog = discover().unwrap();
    for entry in &mut catalog.streams {
        if selected.contains(&entry.tap_stream_id.as_str()) {
            entry.select();
        }
    }
    catalog
}

#[test]
fn test_selected_streams_in_catalog_order() {
    let catalog = catalog_with(&["accounts", "ads_reports", "ads"]);
    let names: Vec<&str> = catalog
        .selected_streams(None)
        .iter()
        .map(|s| s.tap_stream_id.as_str())
        .collect();

    assert_eq!(names, vec!["ads_reports", "ads", "accounts"]);
}

#[test]
fn test_currently_syncing_goes_first() {
    let catalog = catalog_with(&["accounts", "ads_reports", "ads"]);
    let names: Vec<&str> = catalog
        .selected_streams(Some("ads"))
        .iter()
        .map(|s| s.tap_stream_id.as_str())
        .collect();

    assert_eq!(names, vec!["ads", "accounts", "ads_reports"]);
}

#[test]
fn test_unknown_currently_syncing_is_ignored() {
    let catalog = catalog_with(&["ads", "campaigns"]);
    assert_eq!(catalog.selected_streams(Some("gone")).len(), 2);
}

#[test]
fn test_legacy_schema_selected() {
    let catalog = Catalog::from_json(
        &json!({
            "streams": [{
                "tap_stream_id": "campaigns",
                "stream": "campaigns",
                "schema": {"type": "object", "selected": true, "properties": {}},
                "metadata": []
            }]
        })
        .to_string(),
    )
    .unwrap();

    assert!(catalog.streams[0].is_selected());
    assert_eq!(catalog.streams[0].tap_stream().unwrap(), TapStream::Campaigns);
}

#[test]
fn test_select_all_adds_root_when_missing() {
    let mut catalog = Catalog::from_json(
        &json!({
            "streams": [{
                "tap_stream_id": "ads",
                "stream": "ads",
                "schema": {"type": "object", "properties": {}}
            }]
        })
        .to_string(),
    )
    .unwrap();

    catalog.select_all();
    assert!(catalog.streams[0].is_selected());
    assert!(catalog.streams[0].metadata[0].is_root());
}

#[test]
fn test_field_filter_from_metadata() {
    let mut catalog = catalog_with(&["ads_reports"]);
    let reports = &mut catalog.streams[0];
    for entry in &mut reports.metadata {
        if entry.breadcrumb == crumb(&["properties", "clicks"])
            || entry.breadcrumb == crumb(&["properties", "ad_id"])
        {
            entry.metadata.selected = Some(false);
        }
    }

    let filter = reports.field_filter();
    assert!(filter.is_excluded(&crumb(&["properties", "clicks"])));
    // automatic fields cannot be deselected
    assert!(!filter.is_excluded(&crumb(&["properties", "ad_id"])));
    assert!(!filter.is_excluded(&crumb(&["properties", "impressions"])));
}

#[test]
fn test_unsupported_field_is_excluded() {
    let meta = FieldMetadata::with_inclusion(Inclusion::Unsupported);
    assert!(meta.excludes_field());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_catalog_file_roundtrip() {
    let catalog = catalog_with(&["campaigns"]);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(catalog.to_json_pretty().unwrap().as_bytes())
        .unwrap();

    let loaded = Catalog::from_file(file.path()).unwrap();
    assert_eq!(loaded, catalog);
}

#[test]
fn test_unknown_metadata_keys_survive() {
    let catalog = Catalog::from_json(
        &json!({
            "streams": [{
                "tap_stream_id": "ads",
                "stream": "ads",
                "schema": {"type": "object", "properties": {}},
                "metadata": [{"breadcrumb": [], "metadata": {"selected": true, "custom-key": 7}}]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let root = catalog.streams[0].root_metadata().unwrap();
    assert_eq!(root.extra.get("custom-key"), Some(&json!(7)));
}

#[test]
fn test_missing_catalog_file() {
    let err = Catalog::from_file("/nonexistent/catalog.json").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_invalid_catalog() {
    let err = Catalog::from_json("{\"streams\": 3}").unwrap_err();
    assert!(matches!(err, Error::Catalog { .. }));
}
