//! Exporter self-telemetry
//!
//! Scrape outcomes are recorded per array endpoint and served at
//! `/metrics/exporter`. Only endpoints that accepted a session are tracked,
//! and at most [`MAX_TRACKED_ENDPOINTS`] of them; later ones share the
//! [`OVERFLOW_ENDPOINT`] series.
//!
//! # Metrics
//!
//! - `pure_exporter_scrape_success_total{endpoint="..."}` - successful scrapes
//! - `pure_exporter_scrape_failure_total{endpoint="..."}` - failed scrapes
//! - `pure_exporter_scrape_duration_seconds{endpoint="..."}` - scrape duration histogram
//! - `pure_exporter_subsets_skipped_total{endpoint="..."}` - listings skipped during scrapes
//! - `pure_exporter_connect_failures_total` - scrapes whose session could not be opened

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::exposition::MetricFamily;

/// Scrape duration buckets, in seconds
///
/// Array listings are slow compared to in-process exporters, so the range
/// reaches past a minute.
pub const DEFAULT_HISTOGRAM_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Distinct endpoints with their own series
pub const MAX_TRACKED_ENDPOINTS: usize = 256;

/// Label value shared by endpoints past [`MAX_TRACKED_ENDPOINTS`]
pub const OVERFLOW_ENDPOINT: &str = "other";

/// Thread-safe counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Thread-safe histogram with fixed finite buckets
///
/// The `+Inf` bucket is implied by the observation count.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<f64>,
    bucket_counts: Vec<AtomicU64>,
    /// f64 bits
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(buckets: &[f64]) -> Self {
        let mut bounds: Vec<f64> = buckets.iter().copied().filter(|b| b.is_finite()).collect();
        bounds.sort_by(|a, b| a.total_cmp(b));
        bounds.dedup();

        let bucket_counts = bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets: bounds,
            bucket_counts,
            sum: AtomicU64::new(0.0_f64.to_bits()),
            count: AtomicU64::new(0),
        }
    }

    pub fn with_default_buckets() -> Self {
        Self::new(DEFAULT_HISTOGRAM_BUCKETS)
    }

    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);

        let mut current = self.sum.load(Ordering::Relaxed);
        loop {
            let new = (f64::from_bits(current) + v).to_bits();
            match self
                .sum
                .compare_exchange_weak(current, new, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        for (bound, counter) in self.buckets.iter().zip(&self.bucket_counts) {
            if v <= *bound {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum.load(Ordering::Relaxed))
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// `(upper_bound, cumulative_count)` for every finite bucket
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.buckets
            .iter()
            .zip(&self.bucket_counts)
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_default_buckets()
    }
}

/// Counters for one array endpoint
#[derive(Debug, Default)]
pub struct EndpointMetrics {
    pub scrape_success_total: Counter,
    pub scrape_failure_total: Counter,
    pub scrape_duration_seconds: Histogram,
    pub subsets_skipped_total: Counter,
}

/// Registry of per-endpoint scrape telemetry
#[derive(Debug, Clone, Default)]
pub struct InternalMetrics {
    endpoints: Arc<RwLock<BTreeMap<String, Arc<EndpointMetrics>>>>,
    connect_failures: Arc<Counter>,
}

impl InternalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics of `endpoint`, created on first use
    ///
    /// Once [`MAX_TRACKED_ENDPOINTS`] are tracked, new endpoints get the
    /// [`OVERFLOW_ENDPOINT`] entry.
    pub fn endpoint(&self, endpoint: &str) -> Arc<EndpointMetrics> {
        if let Some(metrics) = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
        {
            return Arc::clone(metrics);
        }

        let mut endpoints = self.endpoints.write().unwrap_or_else(PoisonError::into_inner);
        let key = if endpoints.contains_key(endpoint) || endpoints.len() < MAX_TRACKED_ENDPOINTS {
            endpoint
        } else {
            OVERFLOW_ENDPOINT
        };
        Arc::clone(endpoints.entry(key.to_string()).or_default())
    }

    /// A scrape that never got a session; not attributed to its endpoint
    pub fn record_connect_failure(&self) {
        self.connect_failures.inc();
    }

    pub fn connect_failures(&self) -> u64 {
        self.connect_failures.get()
    }

    pub fn record_scrape_success(&self, endpoint: &str, duration_seconds: f64, skipped: usize) {
        let metrics = self.endpoint(endpoint);
        metrics.scrape_success_total.inc();
        metrics.scrape_duration_seconds.observe(duration_seconds);
        metrics.subsets_skipped_total.inc_by(skipped as u64);
    }

    pub fn record_scrape_failure(&self, endpoint: &str, duration_seconds: f64) {
        let metrics = self.endpoint(endpoint);
        metrics.scrape_failure_total.inc();
        metrics.scrape_duration_seconds.observe(duration_seconds);
    }

    /// Families for every endpoint seen so far, endpoints in sorted order
    pub fn families(&self) -> Vec<MetricFamily> {
        let keys = ["endpoint"];
        let mut success = MetricFamily::counter(
            "pure_exporter_scrape_success_total",
            "Total number of successful scrapes",
            &keys,
        );
        let mut failure = MetricFamily::counter(
            "pure_exporter_scrape_failure_total",
            "Total number of failed scrapes",
            &keys,
        );
        let mut duration = MetricFamily::histogram(
            "pure_exporter_scrape_duration_seconds",
            "Histogram of scrape durations",
            &keys,
        );
        let mut skipped = MetricFamily::counter(
            "pure_exporter_subsets_skipped_total",
            "Total number of upstream listings skipped during scrapes",
            &keys,
        );
        let mut connect_failures = MetricFamily::counter(
            "pure_exporter_connect_failures_total",
            "Total number of scrapes whose upstream session could not be opened",
            &[],
        );
        if self.connect_failures() > 0 {
            connect_failures.set(self.connect_failures() as f64);
        }

        let endpoints = self.endpoints.read().unwrap_or_else(PoisonError::into_inner);
        for (endpoint, metrics) in endpoints.iter() {
            let labels = [endpoint.clone()];
            success.push(labels.clone(), metrics.scrape_success_total.get() as f64);
            failure.push(labels.clone(), metrics.scrape_failure_total.get() as f64);
            let histogram = &metrics.scrape_duration_seconds;
            duration.push_histogram(&labels, &histogram.buckets(), histogram.sum(), histogram.count());
            skipped.push(labels, metrics.subsets_skipped_total.get() as f64);
        }

        vec![success, failure, duration, skipped, connect_failures]
    }
}

static INTERNAL_METRICS: OnceLock<InternalMetrics> = OnceLock::new();

/// Process-wide registry
pub fn internal_metrics() -> &'static InternalMetrics {
    INTERNAL_METRICS.get_or_init(InternalMetrics::new)
}
