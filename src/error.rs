//! Error types for pure-exporter
//!
//! `CollectorError` covers a single upstream REST call, `ScrapeError` is what a
//! scrape surfaces when it cannot produce a consistent payload, and `AppError`
//! is the HTTP-facing error rendered by axum.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::collector::EntityClass;

/// Failure of one upstream call
#[derive(Error, Debug)]
pub enum CollectorError {
    /// HTTP client could not be built
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Response body could not be read
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// Body was not the JSON shape we expect
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The value is the configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// TCP/TLS connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The API token was rejected or no session header was returned
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Endpoint string is not a usable host or URL
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The data source has no REST resource for this entity class
    #[error("Entity class '{0}' is not served by this array type")]
    UnsupportedClass(&'static str),
}

impl CollectorError {
    /// Whether the upstream reported the request as something this array
    /// model or firmware does not provide.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            CollectorError::UnsupportedClass(_)
                | CollectorError::HttpStatus(400 | 404 | 405 | 501)
        )
    }

    /// HTTP status code, when the upstream produced one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CollectorError::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        CollectorError::Timeout(Some(ms))
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured duration here
            CollectorError::Timeout(None)
        } else if err.is_connect() {
            CollectorError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            CollectorError::HttpRequest(err)
        } else {
            CollectorError::HttpResponse(err)
        }
    }
}

/// Scrape-level failure
///
/// Only the identity listing of an entity class and the session setup can
/// fail a scrape; subset listings are absorbed by the aggregator.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The seed listing for an entity class failed
    #[error("Upstream unavailable while listing {class}: {source}")]
    UpstreamUnavailable {
        class: EntityClass,
        #[source]
        source: CollectorError,
    },

    /// The upstream session could not be opened
    #[error("Connection for {endpoint} not initialized: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: CollectorError,
    },
}

impl ScrapeError {
    pub fn upstream(class: EntityClass, source: CollectorError) -> Self {
        ScrapeError::UpstreamUnavailable { class, source }
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Malformed scrape request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or malformed API token
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown array type in the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Scrape could not be completed
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, public_message, log_message) = match self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                e.to_string(),
            ),
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.clone(), e),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized Access".to_string(),
                "missing or invalid api token".to_string(),
            ),
            AppError::NotFound(e) => (StatusCode::NOT_FOUND, "Not Found".to_string(), e),
            AppError::Scrape(e) => (StatusCode::BAD_GATEWAY, e.to_string(), e.to_string()),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
                e,
            ),
        };

        tracing::error!(status = %status, error = %log_message, "Request failed");

        (status, public_message).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
