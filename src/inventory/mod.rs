//! Per-scrape entity inventories
//!
//! An inventory wraps one upstream session for the duration of a scrape and
//! lazily lists or aggregates each entity class the first time a builder
//! asks for it. Every later request in the same scrape is served from the
//! cached result. A new inventory is created per scrape, so nothing is ever
//! shared between scrapes.

mod flasharray;
mod flashblade;

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::collector::{aggregate, AggregationPlan, DataSource, EntityClass, EntityCollection, Query, Record};
use crate::error::{CollectorError, ScrapeError};

pub use flasharray::FlashArrayInventory;
pub use flashblade::FlashBladeInventory;

/// A listing whose failure fails the scrape
async fn list_required(
    source: &dyn DataSource,
    class: EntityClass,
    query: &Query,
) -> Result<Vec<Record>, ScrapeError> {
    source
        .list(class, query)
        .await
        .map_err(|e| ScrapeError::upstream(class, e))
}

/// A best-effort listing; failures are logged, counted and read as empty
async fn list_optional(
    source: &dyn DataSource,
    class: EntityClass,
    query: &Query,
    skipped: &AtomicUsize,
) -> Vec<Record> {
    match source.list(class, query).await {
        Ok(records) => records,
        Err(e) => {
            if e.is_unsupported() {
                debug!(class = %class, query = %query, error = %e, "Listing not supported, skipping");
            } else {
                warn!(class = %class, query = %query, error = %e, "Listing failed, skipping");
            }
            skipped.fetch_add(1, Ordering::Relaxed);
            Vec::new()
        }
    }
}

/// Aggregate a plan into `cell` on first use
async fn aggregated<'c>(
    source: &dyn DataSource,
    cell: &'c OnceCell<EntityCollection>,
    plan: fn() -> AggregationPlan,
) -> Result<&'c EntityCollection, ScrapeError> {
    cell.get_or_try_init(|| async move { aggregate(source, &plan()).await })
        .await
}

/// List a required class into `cell` on first use
async fn listed<'c>(
    source: &dyn DataSource,
    cell: &'c OnceCell<Vec<Record>>,
    class: EntityClass,
    query: Query,
) -> Result<&'c [Record], ScrapeError> {
    cell.get_or_try_init(|| async move { list_required(source, class, &query).await })
        .await
        .map(Vec::as_slice)
}

/// An array-wide listing came back without its single record
fn empty_listing(class: EntityClass) -> ScrapeError {
    ScrapeError::upstream(class, CollectorError::JsonParse("empty listing".to_string()))
}
