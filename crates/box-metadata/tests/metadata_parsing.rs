//! Integration tests for parsing Box metadata API data.
//!
//! These tests validate that the box-metadata models can correctly deserialize
//! representative API responses.

use std::fs;
use std::path::PathBuf;

use box_metadata::models::{MetadataTemplateList, SearchResults};
use box_metadata::{AdvancedSearchParams, MetadataFilter, SearchParams};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

#[test]
fn test_deserialize_template_list() {
    let json_data = load_fixture("enterprise_templates.json");
    let list: MetadataTemplateList = serde_json::from_str(&json_data)
        .unwrap_or_else(|e| panic!("Failed to deserialize template list: {}", e));

    assert_eq!(list.entries.len(), 2, "Expected 2 templates in test data");
    assert_eq!(list.limit, Some(100));
    assert!(list.next_marker.is_none());
}

#[test]
fn test_contract_template_fields() {
    let json_data = load_fixture("enterprise_templates.json");
    let list: MetadataTemplateList = serde_json::from_str(&json_data).unwrap();

    let contract = list
        .entries
        .iter()
        .find(|t| t.template_key == "contractTracking")
        .expect("Should have a contract tracking template");

    assert_eq!(contract.scope, "enterprise_490685");
    assert_eq!(contract.display_name.as_deref(), Some("Contract Tracking"));
    assert_eq!(contract.hidden, Some(false));
    assert_eq!(contract.fields.len(), 3);

    let stage = contract.field("stage").expect("Should have a stage field");
    assert_eq!(stage.field_type, "enum");
    assert!(stage.has_options());
    assert_eq!(
        stage.options.as_deref(),
        Some(
            &[
                "Draft".to_string(),
                "Under Review".to_string(),
                "Signed".to_string()
            ][..]
        )
    );
    assert_eq!(
        stage.description.as_deref(),
        Some("Where the contract is in its lifecycle")
    );

    let signed_at = contract.field("signedAt").unwrap();
    assert_eq!(signed_at.field_type, "date");
    assert_eq!(signed_at.hidden, Some(true));
    assert!(signed_at.options.is_none());
}

#[test]
fn test_multi_select_field_options() {
    let json_data = load_fixture("enterprise_templates.json");
    let list: MetadataTemplateList = serde_json::from_str(&json_data).unwrap();

    let invoice = &list.entries[1];
    assert_eq!(invoice.template_key, "invoice");
    let departments = invoice.field("departments").unwrap();
    assert!(departments.has_options());
    assert_eq!(departments.options.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_template_reserializes_option_keys() {
    let json_data = load_fixture("enterprise_templates.json");
    let list: MetadataTemplateList = serde_json::from_str(&json_data).unwrap();

    let value = serde_json::to_value(&list.entries[0]).unwrap();
    assert_eq!(value["fields"][1]["options"][1]["key"], "Under Review");

    let reparsed: box_metadata::MetadataTemplate = serde_json::from_value(value).unwrap();
    assert_eq!(reparsed, list.entries[0]);
}

#[test]
fn test_deserialize_search_results() {
    let json_data = load_fixture("search_results.json");
    let results: SearchResults = serde_json::from_str(&json_data).unwrap();

    assert_eq!(results.total_count, Some(2));
    assert_eq!(results.entries.len(), 2);
    assert_eq!(results.entries[1]["type"], "folder");
}

#[test]
fn test_search_query_for_fixture_templates() {
    let mut metadata = AdvancedSearchParams::new();
    metadata.add_metadata_filter(
        MetadataFilter::new()
            .with_template_key("contractTracking")
            .with_scope("enterprise")
            .with_filter("stage", "Under Review"),
    );

    let params = SearchParams {
        query: Some("ACME".into()),
        ancestor_folder_ids: vec!["0".into(), "67890".into()],
        metadata,
        ..SearchParams::default()
    };

    let query = params.to_query().unwrap().to_string();
    assert!(query.starts_with("?query=ACME&ancestor_folder_ids=0%2c67890&mdfilters="));
    assert!(query.contains("%22stage%22%3a%22Under+Review%22"));
    assert_eq!(query.matches('?').count(), 1);
    assert_eq!(query.matches('&').count(), 2);
}
