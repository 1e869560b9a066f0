//! Asynchronous client for metadata templates and metadata-filtered search.

use crate::models::{MetadataTemplate, MetadataTemplateList, SearchParams, SearchResults};
use crate::Result;
use box_core::config::BoxClientConfig;
use box_core::connection::get_resource;
use box_core::{ApiConnection, HttpConnectionBuilder, QueryStringBuilder, UrlTemplate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const METADATA_TEMPLATE_URL_TEMPLATE: UrlTemplate = UrlTemplate::new("metadata_templates/%s");
const METADATA_TEMPLATE_SCHEMA_URL_TEMPLATE: UrlTemplate =
    UrlTemplate::new("metadata_templates/%s/%s/schema");
const SEARCH_URL_TEMPLATE: UrlTemplate = UrlTemplate::new("search");

/// Scope holding the templates defined by the user's enterprise.
pub const ENTERPRISE_SCOPE: &str = "enterprise";

/// Asynchronous metadata client.
#[derive(Clone)]
pub struct MetadataClient {
    connection: Arc<dyn ApiConnection>,
}

impl MetadataClient {
    /// Create a client over an existing connection.
    #[must_use]
    pub fn new(connection: Arc<dyn ApiConnection>) -> Self {
        Self { connection }
    }

    /// Create a client with an HTTP connection built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`box_core::Error::ValidationError`] if `config` fails
    /// validation and [`box_core::Error::ConfigError`] if the HTTP client
    /// cannot be built.
    pub fn from_config(config: &BoxClientConfig) -> Result<Self> {
        let connection = HttpConnectionBuilder::from_config(config)?.build()?;
        Ok(Self::new(Arc::new(connection)))
    }

    /// Access the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn ApiConnection> {
        &self.connection
    }

    /// List all templates defined by the user's enterprise.
    ///
    /// # Errors
    ///
    /// Same as [`MetadataClient::templates`].
    pub async fn enterprise_templates(&self) -> Result<Vec<MetadataTemplate>> {
        self.templates(ENTERPRISE_SCOPE).await
    }

    /// List all templates in `scope`, following pagination markers.
    ///
    /// Stops at the first page without a marker, or whose marker was already
    /// followed.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`MetadataClient::templates_page`]; pages
    /// fetched before it are discarded.
    pub async fn templates(&self, scope: &str) -> Result<Vec<MetadataTemplate>> {
        let mut templates = Vec::new();
        let mut seen = HashSet::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self.templates_page(scope, None, marker.as_deref()).await?;
            templates.extend(page.entries);

            match page.next_marker {
                Some(next) if !next.is_empty() && seen.insert(next.clone()) => {
                    debug!(scope, marker = %next, "fetching next metadata template page");
                    marker = Some(next);
                }
                Some(next) if !next.is_empty() => {
                    warn!(scope, marker = %next, "metadata template marker repeated, stopping");
                    break;
                }
                _ => break,
            }
        }

        Ok(templates)
    }

    /// Fetch a single page of templates in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`box_core::Error::InvalidEndpoint`] if `scope` is not a single
    /// path segment, or any transport, status or decoding error from the
    /// connection.
    pub async fn templates_page(
        &self,
        scope: &str,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<MetadataTemplateList> {
        let mut query = QueryStringBuilder::new();
        if let Some(limit) = limit {
            query.append_number("limit", limit);
        }
        if let Some(marker) = marker {
            query.append_param("marker", marker);
        }

        let url = METADATA_TEMPLATE_URL_TEMPLATE.build_with_query(
            self.connection.base_url(),
            &query,
            &[scope],
        )?;
        get_resource(self.connection.as_ref(), url).await
    }

    /// Fetch the schema of a single template.
    ///
    /// # Errors
    ///
    /// Returns [`box_core::Error::InvalidEndpoint`] if `scope` or
    /// `template_key` is not a single path segment, [`box_core::Error::NotFound`]
    /// for an unknown template, or any other connection error.
    pub async fn template_info(&self, scope: &str, template_key: &str) -> Result<MetadataTemplate> {
        let url = METADATA_TEMPLATE_SCHEMA_URL_TEMPLATE
            .build(self.connection.base_url(), &[scope, template_key])?;
        get_resource(self.connection.as_ref(), url).await
    }

    /// Search for items, optionally filtered by metadata.
    ///
    /// # Errors
    ///
    /// Returns [`box_core::Error::ParseError`] if the metadata filters cannot be
    /// serialized, or any transport, status or decoding error from the
    /// connection.
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResults> {
        let query = params.to_query()?;
        let url =
            SEARCH_URL_TEMPLATE.build_with_query(self.connection.base_url(), &query, &[])?;
        get_resource(self.connection.as_ref(), url).await
    }
}
