//! Metadata templates and metadata-filtered search for the Box content API.
//!
//! Provides strongly typed models for metadata templates and their fields,
//! a builder for advanced-search metadata filters, and an asynchronous client
//! that issues the corresponding requests through a
//! [`box_core::ApiConnection`].

#![deny(missing_docs)]
#![warn(clippy::missing_errors_doc)]

pub mod client;
pub mod models;

pub use client::MetadataClient;
pub use models::{
    AdvancedSearchParams, MetadataField, MetadataFilter, MetadataTemplate, MetadataTemplateList,
    SearchParams, SearchResults,
};

/// Convenient result alias using the shared Box error type.
pub type Result<T> = box_core::Result<T>;
