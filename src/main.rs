//! pure-exporter - Prometheus exporter for Pure Storage arrays
//!
//! Serves FlashArray and FlashBlade metrics scraped on demand from the
//! arrays' management REST APIs.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pure_exporter::{cli::Cli, config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pure_exporter::init_logging(&cli.log_level.to_string())?;

    let mut config = if cli.validate {
        Config::load(&cli.config)?
    } else {
        Config::load_or_default(&cli.config)?
    };
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting pure-exporter"
    );

    server::run(config).await?;

    Ok(())
}
