//! HTTP fetch plumbing for feed sources.
//!
//! Fetching is strictly a collaborator invoked before the normalization
//! engine is entered: it hands back the response body, content type, and
//! status, and owns all retry/timeout policy. The engine itself never
//! performs I/O.

use std::net::IpAddr;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use url::Url;

use crate::config::FetchConfig;

/// Errors that can occur while fetching a feed source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Source URL failed validation (scheme, localhost, private ranges)
    #[error("Invalid source URL: {0}")]
    InvalidSource(String),
}

/// A fetched feed body with the response metadata callers may need for
/// failure messages or content sniffing.
#[derive(Debug)]
pub struct FetchedFeed {
    pub body: String,
    pub content_type: Option<String>,
    pub status: u16,
}

/// Validates a URL for use as a feed source.
///
/// Rejects non-HTTP(S) schemes, localhost, and private/link-local IP
/// ranges, so a hostile subscription list cannot point the fetcher at
/// internal services.
pub fn validate_source_url(url_str: &str) -> Result<Url, FetchError> {
    let url =
        Url::parse(url_str).map_err(|e| FetchError::InvalidSource(format!("{url_str}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidSource(format!(
                "unsupported scheme: {scheme}"
            )))
        }
    }

    if let Some(host) = url.host_str() {
        if host == "localhost" {
            return Err(FetchError::InvalidSource("localhost not allowed".into()));
        }
        let host_for_parse = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err(FetchError::InvalidSource(format!(
                    "private address not allowed: {ip}"
                )));
            }
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}

/// Fetches a feed source with retry, timeout, and size-limit policy.
///
/// Rate limiting (429) and server errors (5xx) back off exponentially up
/// to `max_retries`; client errors fail immediately. The body is read as
/// a bounded stream and checked against Content-Length, retrying
/// interrupted downloads the same way.
///
/// The URL is fetched as given; callers taking sources from untrusted
/// input validate them first with [`validate_source_url`].
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    config: &FetchConfig,
) -> Result<FetchedFeed, FetchError> {
    let mut retry_count = 0;
    loop {
        let response = tokio::time::timeout(
            Duration::from_secs(config.timeout_secs),
            client.get(url).send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if retry_count >= config.max_retries {
                return Err(FetchError::RateLimited(config.max_retries));
            }
            let delay_secs = 2u64.pow(retry_count); // 2s, 4s, 8s
            tracing::warn!(
                url = %url,
                retry = retry_count,
                delay_secs = delay_secs,
                "Rate limited, backing off"
            );
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        if response.status().is_server_error() {
            if retry_count >= config.max_retries {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }
            let delay_secs = 2u64.pow(retry_count);
            tracing::warn!(
                url = %url,
                status = %response.status(),
                retry = retry_count,
                delay_secs = delay_secs,
                "Server error, retrying after delay"
            );
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match read_limited_bytes(response, config.max_body_bytes).await {
            Ok(bytes) => {
                return Ok(FetchedFeed {
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                    content_type,
                    status,
                });
            }
            Err(FetchError::IncompleteResponse { expected, received }) => {
                if retry_count >= config.max_retries {
                    return Err(FetchError::IncompleteResponse { expected, received });
                }
                let delay_secs = 2u64.pow(retry_count);
                tracing::debug!(
                    url = %url,
                    expected = expected,
                    received = received,
                    attempt = retry_count + 1,
                    delay_secs = delay_secs,
                    "Retrying incomplete download"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // An interrupted transfer can deliver fewer bytes than advertised;
    // callers retry this with backoff.
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
