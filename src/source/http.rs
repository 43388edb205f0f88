//! HTTP plumbing shared by the source adapters
//!
//! This module handles:
//! - Building HTTP clients that present a browser-like header set
//! - GET requests with query parameters
//! - Classifying transport errors as transient failures

use crate::source::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, UPGRADE_INSECURE_REQUESTS};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// User agent sent when the configuration does not override it
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:66.0) Gecko/20100101 Firefox/66.0";

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl Page {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds an HTTP client with a browser-like header set
///
/// # Arguments
///
/// * `user_agent` - User agent override; `BROWSER_USER_AGENT` when `None`
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shelf_scout::source::build_http_client;
///
/// let client = build_http_client(None).unwrap();
/// ```
pub fn build_http_client(user_agent: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(user_agent.unwrap_or(BROWSER_USER_AGENT))
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page with the given query parameters
///
/// Non-success statuses are returned as pages, not errors: anti-bot pages
/// often arrive with a 503 and the adapter has to look at the body to tell
/// them apart from ordinary outages.
///
/// # Error Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Timeout | Transient |
/// | Connection failure | Transient |
/// | Body decode failure | Transient |
/// | Any other transport error | Transient |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `base_url` - Endpoint to query
/// * `params` - Query parameters appended to the endpoint
pub async fn fetch_page(
    client: &Client,
    base_url: &Url,
    params: &[(&str, &str)],
) -> Result<Page, FetchError> {
    let mut url = base_url.clone();
    url.query_pairs_mut().extend_pairs(params);

    tracing::debug!("GET {}", url);

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| classify_transport_error(&e))?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::transient(format!("Failed to read body: {}", e)))?;

    Ok(Page {
        url: final_url,
        status,
        body,
    })
}

fn classify_transport_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::transient("Request timeout")
    } else if e.is_connect() {
        FetchError::transient(format!("Connection failed: {}", e))
    } else {
        FetchError::transient(e.to_string())
    }
}
