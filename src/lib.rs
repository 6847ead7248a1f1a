//! pure-exporter library
//!
//! Collects capacity, performance and health data from Pure Storage
//! FlashArray and FlashBlade management APIs and renders it in the
//! Prometheus text exposition format.

pub mod builders;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod facade;
pub mod identifier;
pub mod inventory;
pub mod mapping;
pub mod metrics;
pub mod server;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// `RUST_LOG` wins over `level` when set.
///
/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
