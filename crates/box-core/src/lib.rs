//! # box-core
//!
//! Core types and utilities for working with the Box content API.
//!
//! This crate provides the error type, the query-string builder with its
//! wire-compatible percent-encoding, URL templates for resource paths, and
//! the HTTP connection used by the resource crates.
//!
//! ## Modules
//!
//! - [`error`] - Error type and HTTP status code mapping
//! - [`query`] - Query-string construction and URL merging
//! - [`url_template`] - `%s` path templates for API resources
//! - [`client`] - HTTP client tuning and timeout defaults
//! - [`config`] - Serializable client configuration
//! - [`connection`] - The API connection seam and its `reqwest` implementation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod query;
pub mod url_template;

// Re-export commonly used types
pub use connection::{ApiConnection, HttpConnection, HttpConnectionBuilder};
pub use error::{Error, Result};
pub use query::QueryStringBuilder;
pub use url_template::UrlTemplate;
