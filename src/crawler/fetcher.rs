//! HTTP fetcher implementation
//!
//! The crawler never talks to the network directly: it goes through the
//! [`Fetcher`] trait, so tests and embedders can inject their own fetch
//! capability. [`HttpFetcher`] is the reqwest-backed implementation used by
//! the command-line tool.
//!
//! Retries, redirects and TLS are the fetcher's business, not the crawler's.
//! `HttpFetcher` follows reqwest's default redirect policy and enforces the
//! configured timeouts; it does not retry.

use crate::config::FetchConfig;
use crate::FetchError;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A capability that performs one GET and returns the response body
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the raw body bytes
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Fetches `url` and decodes the body as UTF-8, replacing invalid sequences
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        async move {
            let body = self.fetch(url).await?;
            Ok(String::from_utf8_lossy(&body).into_owned())
        }
    }
}

impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        (**self).fetch(url)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_sieve::config::FetchConfig;
/// use sumi_sieve::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config).map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` and decodes the body as JSON
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let body = self.fetch(url).await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Json {
            url: url.to_string(),
            source,
        })
    }
}

impl Fetcher for HttpFetcher {
    /// Fetches a URL with error classification
    ///
    /// | Condition             | Error               |
    /// |-----------------------|---------------------|
    /// | Unparsable URL        | `InvalidUrl`        |
    /// | Scheme not http(s)    | `UnsupportedScheme` |
    /// | Timeout               | `Timeout`           |
    /// | Connection failure    | `Connect`           |
    /// | Non-2xx status        | `Status`            |
    /// | Anything else         | `Http`              |
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
            });
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify_error(url, e))?;
        tracing::trace!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url, source: error }
    } else {
        FetchError::Http { url, source: error }
    }
}
