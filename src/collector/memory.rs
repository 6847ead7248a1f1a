//! In-memory data source
//!
//! Serves canned listings keyed by (entity class, query). Listings that were
//! never registered answer like an array that does not know the resource
//! (HTTP 404). Used by tests and benchmarks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{CollectResult, DataSource, EntityClass, Query, Record};
use crate::error::CollectorError;

enum Canned {
    Records(Vec<Record>),
    Failure(CollectorError),
}

/// Canned [`DataSource`]
#[derive(Default)]
pub struct MemorySource {
    listings: HashMap<(EntityClass, Query), Canned>,
    calls: HashMap<EntityClass, AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the records returned for `class` under `query`
    pub fn with_listing(mut self, class: EntityClass, query: Query, records: Vec<Record>) -> Self {
        self.listings.insert((class, query), Canned::Records(records));
        self.calls.entry(class).or_default();
        self
    }

    /// Make `class` under `query` fail with `error`
    pub fn with_failure(mut self, class: EntityClass, query: Query, error: CollectorError) -> Self {
        self.listings.insert((class, query), Canned::Failure(error));
        self.calls.entry(class).or_default();
        self
    }

    /// Number of `list` calls made for a class
    pub fn calls(&self, class: EntityClass) -> usize {
        self.calls
            .get(&class)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Total number of `list` calls
    pub fn total_calls(&self) -> usize {
        self.calls.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }
}

/// Rebuild a stored error; `reqwest::Error` cannot be cloned.
fn replay(err: &CollectorError) -> CollectorError {
    match err {
        CollectorError::HttpStatus(code) => CollectorError::HttpStatus(*code),
        CollectorError::Timeout(ms) => CollectorError::Timeout(*ms),
        CollectorError::JsonParse(msg) => CollectorError::JsonParse(msg.clone()),
        CollectorError::AuthenticationFailed => CollectorError::AuthenticationFailed,
        CollectorError::InvalidEndpoint(e) => CollectorError::InvalidEndpoint(e.clone()),
        CollectorError::UnsupportedClass(c) => CollectorError::UnsupportedClass(c),
        other => CollectorError::ConnectionFailed(other.to_string()),
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn list(&self, class: EntityClass, query: &Query) -> CollectResult<Vec<Record>> {
        if let Some(counter) = self.calls.get(&class) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        match self.listings.get(&(class, query.clone())) {
            Some(Canned::Records(records)) => Ok(records.clone()),
            Some(Canned::Failure(err)) => Err(replay(err)),
            None => Err(CollectorError::HttpStatus(404)),
        }
    }
}
