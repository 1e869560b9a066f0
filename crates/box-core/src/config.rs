//! Configuration structures for Box API clients.
//!
//! [`BoxClientConfig`] is serde-deserializable so it can be loaded from any
//! format the application already uses, and is validated with `validator`
//! before use.

use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Public Box API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.box.com/2.0/";

/// Configuration for a Box API client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BoxClientConfig {
    /// API base URL, including the version segment
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer access token. Never serialized.
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl BoxClientConfig {
    /// Create a new client configuration for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Set the bearer access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the base URL, making sure it ends with `/`.
    ///
    /// Without the trailing slash, joining a resource path would replace the
    /// version segment (`/2.0`) instead of extending it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL: {}", e)))?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}

impl Default for BoxClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
