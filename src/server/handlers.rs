//! HTTP request handlers
//!
//! Scrape handlers authenticate the request, open an upstream session,
//! run the collection façade and render the families.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::AppState;
use crate::collector::{DataSource, FlashArrayClient, FlashBladeClient, UpstreamSettings};
use crate::error::{AppError, AppResult, ScrapeError};
use crate::exposition::{PrometheusFormatter, CONTENT_TYPE};
use crate::facade::{self, Collection, Scope};

static FLASHARRAY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid token regex")
});

static FLASHBLADE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^T-[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid token regex")
});

/// Product line a scrape targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayType {
    FlashArray,
    FlashBlade,
}

impl ArrayType {
    fn token_pattern(self) -> &'static Regex {
        match self {
            ArrayType::FlashArray => &FLASHARRAY_TOKEN,
            ArrayType::FlashBlade => &FLASHBLADE_TOKEN,
        }
    }

    /// Whether `token` has the shape of this product's API tokens
    pub fn accepts_token(self, token: &str) -> bool {
        self.token_pattern().is_match(token)
    }
}

/// Query parameters of a scrape request
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeParams {
    pub endpoint: Option<String>,
    /// Used when no `Authorization: Bearer` header is sent
    pub apitoken: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Root endpoint - lists the scrape URLs
pub async fn root() -> Html<String> {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>pure-exporter</title>
</head>
<body>
    <h1>pure-exporter</h1>
    <p>Version: {}</p>
    <table>
        <tr><th>Path</th><th>Parameters</th></tr>
        <tr><td><a href="/metrics/flasharray?endpoint=host">/metrics/flasharray</a></td><td>endpoint, apitoken</td></tr>
        <tr><td>/metrics/flasharray/{{array|volumes|hosts|pods}}</td><td>endpoint, apitoken</td></tr>
        <tr><td><a href="/metrics/flashblade?endpoint=host">/metrics/flashblade</a></td><td>endpoint, apitoken</td></tr>
        <tr><td>/metrics/flashblade/{{array|clients|usage}}</td><td>endpoint, apitoken</td></tr>
        <tr><td><a href="/metrics/exporter">/metrics/exporter</a></td><td></td></tr>
        <tr><td><a href="/health">/health</a></td><td></td></tr>
    </table>
    <p>The API token may be sent as <code>Authorization: Bearer</code> instead of <code>apitoken</code>.</p>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
    );
    Html(html)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn flasharray(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScrapeParams>,
) -> AppResult<Response> {
    scrape(&state, ArrayType::FlashArray, Scope::All, &headers, params).await
}

pub async fn flasharray_scope(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    headers: HeaderMap,
    Query(params): Query<ScrapeParams>,
) -> AppResult<Response> {
    scrape(&state, ArrayType::FlashArray, Scope::parse(&scope), &headers, params).await
}

pub async fn flashblade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScrapeParams>,
) -> AppResult<Response> {
    scrape(&state, ArrayType::FlashBlade, Scope::All, &headers, params).await
}

pub async fn flashblade_scope(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    headers: HeaderMap,
    Query(params): Query<ScrapeParams>,
) -> AppResult<Response> {
    scrape(&state, ArrayType::FlashBlade, Scope::parse(&scope), &headers, params).await
}

/// The exporter's own scrape telemetry
pub async fn exporter_metrics(State(state): State<AppState>) -> Response {
    let output = PrometheusFormatter::new().format(&state.metrics.families());
    metrics_response(output)
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Bearer header first, then the `apitoken` parameter
fn api_token(headers: &HeaderMap, params: &ScrapeParams) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .or_else(|| params.apitoken.clone())
        .filter(|t| !t.is_empty())
}

#[instrument(skip_all, fields(array_type = ?array_type, scope = %scope))]
async fn scrape(
    state: &AppState,
    array_type: ArrayType,
    scope: Scope,
    headers: &HeaderMap,
    params: ScrapeParams,
) -> AppResult<Response> {
    let token = api_token(headers, &params).ok_or(AppError::Unauthorized)?;
    if !array_type.accepts_token(&token) {
        return Err(AppError::Unauthorized);
    }
    let endpoint = params
        .endpoint
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("missing 'endpoint' parameter".to_string()))?;

    let start = Instant::now();
    let result = collect(&state.config.upstream, array_type, &endpoint, &token, scope).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(collection) => {
            state
                .metrics
                .record_scrape_success(&endpoint, elapsed, collection.skipped_subsets);
            debug!(
                endpoint = %endpoint,
                duration_ms = (elapsed * 1000.0) as u64,
                families = collection.families.len(),
                skipped_subsets = collection.skipped_subsets,
                "Scrape complete"
            );
            let output = PrometheusFormatter::new().format(&collection.families);
            Ok(metrics_response(output))
        }
        Err(e @ ScrapeError::Connect { .. }) => {
            state.metrics.record_connect_failure();
            Err(e.into())
        }
        Err(e) => {
            state.metrics.record_scrape_failure(&endpoint, elapsed);
            Err(e.into())
        }
    }
}

/// An open upstream session, logged out on drop if not closed explicitly
///
/// A scrape whose client disconnects is dropped mid-collection; the logout
/// then runs on a spawned task.
struct Session<S: DataSource + 'static> {
    source: Arc<S>,
    closed: bool,
}

impl<S: DataSource + 'static> Session<S> {
    fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            closed: false,
        }
    }

    async fn close(mut self) {
        self.source.close().await;
        self.closed = true;
    }
}

impl<S: DataSource + 'static> Deref for Session<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: DataSource + 'static> Drop for Session<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let source = Arc::clone(&self.source);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!("Closing abandoned upstream session");
                runtime.spawn(async move { source.close().await });
            }
            Err(_) => warn!("No runtime left to close upstream session"),
        }
    }
}

/// Open a session, collect, and close the session whatever the outcome
///
/// Connect failures are reported as [`ScrapeError::Connect`].
async fn collect(
    settings: &UpstreamSettings,
    array_type: ArrayType,
    endpoint: &str,
    token: &str,
    scope: Scope,
) -> Result<Collection, ScrapeError> {
    let connect_error = |source| ScrapeError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };

    match array_type {
        ArrayType::FlashArray => {
            let session = FlashArrayClient::connect(settings, endpoint, token)
                .await
                .map(Session::new)
                .map_err(connect_error)?;
            let result = facade::collect_flasharray(&*session, scope).await;
            session.close().await;
            result
        }
        ArrayType::FlashBlade => {
            let session = FlashBladeClient::connect(settings, endpoint, token)
                .await
                .map(Session::new)
                .map_err(connect_error)?;
            let result = facade::collect_flashblade(&*session, scope).await;
            session.close().await;
            result
        }
    }
}

fn metrics_response(output: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], output).into_response()
}
