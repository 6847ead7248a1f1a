//! CLI argument parsing for pure-exporter
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: PURE_EXPORTER_CONFIG)
//! - `--port` / `-p`: Server port (env: PURE_EXPORTER_PORT)
//! - `--bind-address`: Server bind address (env: PURE_EXPORTER_BIND_ADDRESS)
//! - `--tls-enabled`, `--tls-cert-file`, `--tls-key-file`: HTTPS for the exporter itself
//! - `--connect-timeout`, `--read-timeout`: upstream timeouts in milliseconds
//! - `--verify-tls`: verify array certificates (env: PURE_EXPORTER_VERIFY_TLS)
//! - `--validate`: Validate configuration without starting server
//! - `--log-level` / `-l`: Log level (env: PURE_EXPORTER_LOG_LEVEL)
//!
//! # Precedence
//!
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// pure-exporter - Prometheus exporter for Pure Storage FlashArray and FlashBlade
///
/// Scrapes arrays on demand: the target endpoint and API token come with
/// every request to /metrics/flasharray or /metrics/flashblade.
#[derive(Parser, Debug)]
#[command(name = "pure-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "PURE_EXPORTER_CONFIG"
    )]
    pub config: PathBuf,

    /// Server port (overrides config file)
    #[arg(short, long, value_name = "PORT", env = "PURE_EXPORTER_PORT")]
    pub port: Option<u16>,

    /// Server bind address (overrides config file)
    #[arg(long, value_name = "ADDRESS", env = "PURE_EXPORTER_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Serve HTTPS (overrides config file)
    #[arg(long, env = "PURE_EXPORTER_TLS_ENABLED")]
    pub tls_enabled: Option<bool>,

    /// Path to TLS certificate file in PEM format
    #[arg(long, value_name = "FILE", env = "PURE_EXPORTER_TLS_CERT_FILE")]
    pub tls_cert_file: Option<String>,

    /// Path to TLS private key file in PEM format
    #[arg(long, value_name = "FILE", env = "PURE_EXPORTER_TLS_KEY_FILE")]
    pub tls_key_file: Option<String>,

    /// Upstream connect timeout in milliseconds
    #[arg(long, value_name = "MS", env = "PURE_EXPORTER_CONNECT_TIMEOUT")]
    pub connect_timeout: Option<u64>,

    /// Upstream request timeout in milliseconds
    #[arg(long, value_name = "MS", env = "PURE_EXPORTER_READ_TIMEOUT")]
    pub read_timeout: Option<u64>,

    /// Verify array TLS certificates
    #[arg(long, env = "PURE_EXPORTER_VERIFY_TLS")]
    pub verify_tls: Option<bool>,

    /// Validate configuration without starting server
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "PURE_EXPORTER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// Apply command-line overrides on top of file values
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref address) = self.bind_address {
            config.server.bind_address = address.clone();
        }
        if let Some(enabled) = self.tls_enabled {
            config.server.tls.enabled = enabled;
        }
        if let Some(ref cert) = self.tls_cert_file {
            config.server.tls.cert_file = Some(cert.clone());
        }
        if let Some(ref key) = self.tls_key_file {
            config.server.tls.key_file = Some(key.clone());
        }
        if let Some(ms) = self.connect_timeout {
            config.upstream.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.read_timeout {
            config.upstream.read_timeout_ms = ms;
        }
        if let Some(verify) = self.verify_tls {
            config.upstream.verify_tls = verify;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}
