//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client
//! - Browser-like default headers for the store-locator site
//! - Routing every GET through the response cache
//! - Error classification into transport failures
//!
//! There is no retry logic. A failed request is never cached, so rerunning the
//! crawl retries exactly the URLs that did not complete.

use crate::cache::Cache;
use crate::config::CrawlerConfig;
use crate::{ConfigError, Result, ShopmapError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> std::result::Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Cached HTTP GET
///
/// The cache key is the request URL. Headers are not part of the key: the
/// same URL is assumed to return the same body for any client.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    cache: Arc<Cache>,
    default_headers: HeaderMap,
    refresh: bool,
}

impl Fetcher {
    /// Creates a fetcher sending `user_agent` by default
    pub fn new(client: Client, cache: Arc<Cache>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client,
            cache,
            default_headers: Self::default_headers(user_agent)?,
            refresh: false,
        })
    }

    /// When set, each URL is fetched again once per run, overwriting its stored response
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Headers that make a request look like it came from a browser
    pub fn default_headers(user_agent: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        Ok(headers)
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Returns the body of `url` using the default headers
    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, &self.default_headers).await
    }

    /// Returns the body of `url`, sending `headers` if it has to be fetched
    pub async fn get_with_headers(&self, url: &str, headers: &HeaderMap) -> Result<String> {
        self.cache
            .fetch(url, self.refresh, || {
                fetch_uncached(&self.client, url, headers.clone())
            })
            .await
    }
}

/// Builds a header value, rejecting control characters
pub fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        ConfigError::Validation(format!("invalid header value '{}': {}", value, e)).into()
    })
}

/// Performs the GET, returning the body decoded as text
///
/// The body is decoded with the charset declared in `Content-Type`, falling
/// back to UTF-8.
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | decoded body |
/// | any other status | TransportFailure with the status code |
/// | timeout / connection error | TransportFailure |
async fn fetch_uncached(client: &Client, url: &str, headers: HeaderMap) -> Result<String> {
    tracing::debug!("GET {}", url);

    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(|e| transport_failure(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ShopmapError::TransportFailure {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    response
        .text()
        .await
        .map_err(|e| transport_failure(url, &e))
}

/// Classifies a reqwest error
fn transport_failure(url: &str, error: &reqwest::Error) -> ShopmapError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    ShopmapError::TransportFailure {
        url: url.to_string(),
        message,
    }
}
