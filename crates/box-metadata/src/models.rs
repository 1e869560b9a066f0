//! Metadata template and search models.

use box_core::QueryStringBuilder;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Result;

/// Deserialize an enum field's `[{"key": ...}, ...]` option list into its keys.
///
/// Entries without a string `key` are skipped.
pub fn deserialize_option_keys<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(value.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(mut map) => match map.remove("key") {
                    Some(Value::String(key)) => Some(key),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }))
}

fn serialize_option_keys<S>(
    options: &Option<Vec<String>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct OptionKey<'a> {
        key: &'a str,
    }

    match options {
        Some(keys) => {
            let mut seq = serializer.serialize_seq(Some(keys.len()))?;
            for key in keys {
                seq.serialize_element(&OptionKey { key })?;
            }
            seq.end()
        }
        None => serializer.serialize_none(),
    }
}

/// A field of a metadata template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataField {
    /// Field type: `string`, `float`, `date`, `enum` or `multiSelect`.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Key used to address the field in metadata instances and filters.
    pub key: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hidden flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// Option keys. Only present for `enum` and `multiSelect` fields.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_option_keys",
        serialize_with = "serialize_option_keys"
    )]
    pub options: Option<Vec<String>>,
}

impl MetadataField {
    /// Returns true for fields whose values are restricted to `options`.
    #[must_use]
    pub fn has_options(&self) -> bool {
        matches!(self.field_type.as_str(), "enum" | "multiSelect")
    }
}

/// A metadata template as returned by `metadata_templates`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataTemplate {
    /// Template ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Template key, unique within its scope.
    pub template_key: String,
    /// Scope, e.g. `enterprise` or `global`.
    pub scope: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Hidden flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// Template fields, in display order.
    #[serde(default)]
    pub fields: Vec<MetadataField>,
}

impl MetadataTemplate {
    /// Look up a field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&MetadataField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// One page of metadata templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataTemplateList {
    /// Templates on this page.
    #[serde(default)]
    pub entries: Vec<MetadataTemplate>,
    /// Page size used by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Marker for the next page, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
}

/// A metadata filter for advanced search.
///
/// Serializes to `{"templateKey": .., "scope": .., "filters": {..}}`. Unset
/// template key and scope are omitted; `filters` is always present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFilter {
    /// Template key to filter on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_key: Option<String>,
    /// Template scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Field key to required value.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl MetadataFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template key.
    #[must_use]
    pub fn with_template_key(mut self, template_key: impl Into<String>) -> Self {
        self.template_key = Some(template_key.into());
        self
    }

    /// Set the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Require `key` to equal `value`. A repeated key replaces the earlier value.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Replace all field filters.
    #[must_use]
    pub fn with_filters(mut self, filters: BTreeMap<String, String>) -> Self {
        self.filters = filters;
        self
    }
}

/// Metadata filters attached to a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedSearchParams {
    metadata_filters: Vec<MetadataFilter>,
}

impl AdvancedSearchParams {
    /// Create an empty set of filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn add_metadata_filter(&mut self, filter: MetadataFilter) -> &mut Self {
        self.metadata_filters.push(filter);
        self
    }

    /// Returns true if at least one filter was added.
    #[must_use]
    pub fn has_metadata_filters(&self) -> bool {
        !self.metadata_filters.is_empty()
    }

    /// The filters in insertion order.
    #[must_use]
    pub fn metadata_filters(&self) -> &[MetadataFilter] {
        &self.metadata_filters
    }

    /// The filters as the JSON array expected by the `mdfilters` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`box_core::Error::ParseError`] if serialization fails.
    pub fn metadata_filters_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metadata_filters)?)
    }
}

/// Parameters supported by the `/search` endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Free-text query.
    pub query: Option<String>,
    /// Restrict to items of this type (`file`, `folder`, `web_link`).
    pub item_type: Option<String>,
    /// Restrict to descendants of these folders.
    pub ancestor_folder_ids: Vec<String>,
    /// Parts of an item to match against (`name`, `description`, ...).
    pub content_types: Vec<String>,
    /// Restrict to these file extensions.
    pub file_extensions: Vec<String>,
    /// Item fields to return.
    pub fields: Vec<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Pagination offset.
    pub offset: Option<u32>,
    /// Metadata filters.
    pub metadata: AdvancedSearchParams,
}

impl SearchParams {
    /// Build the query string for this search.
    ///
    /// Parameters are appended in a fixed order and unset ones are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata filters cannot be serialized.
    pub fn to_query(&self) -> Result<QueryStringBuilder> {
        let mut query = QueryStringBuilder::new();
        if let Some(text) = &self.query {
            query.append_param("query", text);
        }
        if let Some(item_type) = &self.item_type {
            query.append_param("type", item_type);
        }
        push_list(&mut query, "ancestor_folder_ids", &self.ancestor_folder_ids)?;
        push_list(&mut query, "content_types", &self.content_types)?;
        push_list(&mut query, "file_extensions", &self.file_extensions)?;
        push_list(&mut query, "fields", &self.fields)?;
        if let Some(limit) = self.limit {
            query.append_number("limit", limit);
        }
        if let Some(offset) = self.offset {
            query.append_number("offset", offset);
        }
        if self.metadata.has_metadata_filters() {
            query.append_param("mdfilters", &self.metadata.metadata_filters_json()?);
        }

        Ok(query)
    }
}

fn push_list(query: &mut QueryStringBuilder, key: &str, values: &[String]) -> Result<()> {
    if !values.is_empty() {
        query.append_values(key, values)?;
    }
    Ok(())
}

/// Results of a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    /// Total number of matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Offset of this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Matching items, as returned by the API.
    #[serde(default)]
    pub entries: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_field_parses_option_keys() {
        let field: MetadataField = serde_json::from_value(json!({
            "type": "enum",
            "key": "status",
            "displayName": "Status",
            "options": [
                {"key": "draft", "id": "a1"},
                {"key": "final"},
                {"id": "no-key"}
            ]
        }))
        .unwrap();

        assert_eq!(field.field_type, "enum");
        assert_eq!(field.display_name.as_deref(), Some("Status"));
        assert_eq!(
            field.options,
            Some(vec!["draft".to_string(), "final".to_string()])
        );
        assert!(field.has_options());
    }

    #[test]
    fn metadata_field_serializes_options_as_objects() {
        let field = MetadataField {
            field_type: "enum".into(),
            key: "status".into(),
            display_name: None,
            description: None,
            hidden: None,
            options: Some(vec!["draft".into()]),
        };

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({"type": "enum", "key": "status", "options": [{"key": "draft"}]})
        );
    }

    #[test]
    fn metadata_template_field_lookup() {
        let template: MetadataTemplate = serde_json::from_value(json!({
            "templateKey": "invoice",
            "scope": "enterprise_12345",
            "fields": [
                {"type": "float", "key": "amount"},
                {"type": "date", "key": "due"}
            ]
        }))
        .unwrap();

        assert!(template.id.is_none());
        assert_eq!(template.field("due").unwrap().field_type, "date");
        assert!(template.field("missing").is_none());
        assert!(!template.field("amount").unwrap().has_options());
    }

    #[test]
    fn metadata_filter_omits_unset_keys() {
        let filter = MetadataFilter::new().with_filter("status", "final");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"filters": {"status": "final"}})
        );

        let empty = MetadataFilter::new();
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"filters": {}}));
    }

    #[test]
    fn advanced_search_params_json() {
        let mut params = AdvancedSearchParams::new();
        assert!(!params.has_metadata_filters());
        assert_eq!(params.metadata_filters_json().unwrap(), "[]");

        params.add_metadata_filter(
            MetadataFilter::new()
                .with_template_key("invoice")
                .with_scope("enterprise")
                .with_filter("status", "final"),
        );

        assert!(params.has_metadata_filters());
        assert_eq!(
            params.metadata_filters_json().unwrap(),
            r#"[{"templateKey":"invoice","scope":"enterprise","filters":{"status":"final"}}]"#
        );
    }

    #[test]
    fn search_params_to_query_skips_unset() {
        let params = SearchParams::default();
        assert!(params.to_query().unwrap().is_empty());
    }

    #[test]
    fn search_params_to_query_encodes_values() {
        let mut metadata = AdvancedSearchParams::new();
        metadata.add_metadata_filter(
            MetadataFilter::new()
                .with_template_key("invoice")
                .with_scope("enterprise")
                .with_filter("paid", "yes"),
        );

        let params = SearchParams {
            query: Some("tax return".into()),
            item_type: Some("file".into()),
            fields: vec!["name".into(), "size".into()],
            limit: Some(20),
            offset: Some(40),
            metadata,
            ..SearchParams::default()
        };

        assert_eq!(
            params.to_query().unwrap().to_string(),
            "?query=tax+return&type=file&fields=name%2csize&limit=20&offset=40\
             &mdfilters=%5b%7b%22templateKey%22%3a%22invoice%22%2c%22scope%22%3a%22enterprise%22\
             %2c%22filters%22%3a%7b%22paid%22%3a%22yes%22%7d%7d%5d"
        );
    }
}
