//! Shared REST plumbing
//!
//! HTTP client construction, endpoint resolution and response decoding used
//! by both array clients.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};
use url::Url;

use super::{records_from_value, CollectResult, Record};
use crate::config::UpstreamConfig;
use crate::error::CollectorError;

/// Connection settings for upstream sessions
pub type UpstreamSettings = UpstreamConfig;

/// Build the pooled HTTP client for one upstream session
///
/// Arrays ship with self-signed certificates, so verification follows
/// `verify_tls`. The FlashArray session lives in a cookie, hence the store.
pub(crate) fn build_client(settings: &UpstreamSettings) -> CollectResult<Client> {
    ClientBuilder::new()
        .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
        .timeout(Duration::from_millis(settings.read_timeout_ms))
        .danger_accept_invalid_certs(!settings.verify_tls)
        .user_agent(settings.user_agent.clone())
        .cookie_store(true)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(CollectorError::HttpClientInit)
}

/// Resolve an endpoint into a base URL
///
/// A bare host (`fa1.example.com`, `10.0.0.5:8443`) means HTTPS; a full URL
/// is taken as is.
pub(crate) fn base_url(endpoint: &str) -> CollectResult<Url> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(CollectorError::InvalidEndpoint(endpoint.to_string()));
    }

    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let url =
        Url::parse(&candidate).map_err(|_| CollectorError::InvalidEndpoint(endpoint.to_string()))?;
    if url.host_str().is_none() {
        return Err(CollectorError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(url)
}

/// Append `path` to the base URL's path
pub(crate) fn join(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/{}", prefix, path.trim_start_matches('/')));
    url
}

/// Fail on non-success statuses; 401/403 are reported as authentication
/// failures.
pub(crate) fn check_status(response: &Response) -> CollectResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        401 | 403 => Err(CollectorError::AuthenticationFailed),
        code => Err(CollectorError::HttpStatus(code)),
    }
}

/// Read a JSON body
pub(crate) async fn read_json(response: Response) -> CollectResult<serde_json::Value> {
    let body = response
        .text()
        .await
        .map_err(CollectorError::HttpResponse)?;
    serde_json::from_str(&body).map_err(|e| CollectorError::JsonParse(e.to_string()))
}

/// Read a listing body into records
pub(crate) async fn read_records(response: Response) -> CollectResult<Vec<Record>> {
    let value = read_json(response).await?;
    records_from_value(&value)
}

/// Map a transport error, keeping the configured timeout when it fired
pub(crate) fn transport_error(err: reqwest::Error, settings: &UpstreamSettings) -> CollectorError {
    if err.is_timeout() {
        CollectorError::timeout_with_duration(settings.read_timeout_ms)
    } else {
        CollectorError::from(err)
    }
}
