//! Connection to the Box API.
//!
//! Resource clients depend on the [`ApiConnection`] trait rather than on
//! `reqwest` directly. [`HttpConnection`] is the production implementation.
//! Request URLs arrive fully built (query included) and are sent exactly as
//! given: nothing here re-encodes them.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;
use validator::Validate;

use crate::client::ClientConfig;
use crate::config::BoxClientConfig;
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("box-core/", env!("CARGO_PKG_VERSION"));

/// The API connection used by resource clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiConnection: Send + Sync {
    /// Base URL that resource paths are joined onto.
    fn base_url(&self) -> &Url;

    /// Issue a `GET` for `url` and return the decoded JSON body.
    ///
    /// An empty or `204 No Content` response yields [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a non-2xx
    /// status, or the body is not JSON.
    async fn get_json(&self, url: Url) -> Result<Value>;
}

/// Fetch `url` through `connection` and deserialize the body into `T`.
///
/// # Errors
///
/// Propagates connection errors and returns [`Error::ParseError`] when the
/// body does not match `T`.
pub async fn get_resource<T>(connection: &dyn ApiConnection, url: Url) -> Result<T>
where
    T: DeserializeOwned,
{
    let target = url.to_string();
    let value = connection.get_json(url).await?;
    serde_json::from_value(value)
        .map_err(|err| Error::ParseError(format!("Unexpected response for `{target}`: {err}")))
}

/// Builder for [`HttpConnection`].
#[derive(Debug, Clone)]
pub struct HttpConnectionBuilder {
    base_url: Url,
    http_config: ClientConfig,
    access_token: Option<SecretString>,
}

impl HttpConnectionBuilder {
    /// Create a builder from the provided base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the URL does not parse.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let config = BoxClientConfig {
            base_url: base_url.as_ref().to_string(),
            ..BoxClientConfig::default()
        };
        Self::from_config(&config)
    }

    /// Create a builder from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `config` fails validation, which
    /// covers configurations deserialized without going through
    /// [`BoxClientConfig::new`].
    pub fn from_config(config: &BoxClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parse_base_url()?;
        let http_config = ClientConfig::new().with_timeout(config.timeout());

        Ok(Self {
            base_url,
            http_config,
            access_token: config.access_token.clone(),
        })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Authenticate requests with a bearer token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    /// Build the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<HttpConnection> {
        let mut builder = ClientBuilder::new()
            .timeout(self.http_config.timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(self.http_config.connect_timeout);

        if !self.http_config.enable_compression {
            builder = builder.no_gzip();
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpConnection {
            http,
            base_url: self.base_url,
            access_token: self.access_token,
        })
    }
}

/// `reqwest`-backed [`ApiConnection`].
#[derive(Debug, Clone)]
pub struct HttpConnection {
    http: Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

impl HttpConnection {
    /// Construct directly from a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the URL is invalid and
    /// [`Error::ConfigError`] if the HTTP client cannot be created.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        HttpConnectionBuilder::new(base_url)?.build()
    }
}

#[async_trait]
impl ApiConnection for HttpConnection {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let target = url.to_string();
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/json");
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        info!(url = %target, "Box API request");

        let response = request.send().await?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::HttpError(format!("Failed to read response body: {err}")))?;

        debug!(url = %target, %status, len = bytes.len(), "Box API response");

        if status.is_success() {
            return deserialize_body(&target, status, &bytes);
        }

        let text = String::from_utf8_lossy(&bytes).into_owned();
        Err(map_status_to_error(status, text))
    }
}

fn deserialize_body(target: &str, status: StatusCode, bytes: &[u8]) -> Result<Value> {
    if status == StatusCode::NO_CONTENT || bytes.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(bytes)
        .map_err(|err| Error::ParseError(format!("Failed to parse response for `{target}`: {err}")))
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("Box API authentication failed: {text}"))
        }
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Box API temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Box API server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("Box API error {status}: {text}")),
    }
}
