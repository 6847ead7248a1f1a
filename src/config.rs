//! Configuration management for pure-exporter
//!
//! Handles loading and validating configuration from YAML files. Every field
//! has a default, so an absent file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Array session settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// IP address or `localhost`
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS for the exporter's own listener
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// PEM certificate chain
    pub cert_file: Option<String>,

    /// PEM private key
    pub key_file: Option<String>,
}

/// Settings applied to every array session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Bound on a whole request, including the body
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Verify array certificates; arrays usually ship self-signed ones
    #[serde(default)]
    pub verify_tls: bool,

    #[serde(default = "default_flasharray_api_version")]
    pub flasharray_api_version: String,

    #[serde(default = "default_flashblade_api_version")]
    pub flashblade_api_version: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_port() -> u16 {
    9491
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_read_timeout() -> u64 {
    60000
}

fn default_flasharray_api_version() -> String {
    "1.17".to_string()
}

fn default_flashblade_api_version() -> String {
    "1.8".to_string()
}

fn default_user_agent() -> String {
    "Pure_Storage_Prometheus_exporter".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            tls: TlsConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
            verify_tls: false,
            flasharray_api_version: default_flasharray_api_version(),
            flashblade_api_version: default_flashblade_api_version(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    /// Use [`Config::load_or_default`] when the file is optional.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.server.bind_address != "localhost"
            && self.server.bind_address.parse::<std::net::IpAddr>().is_err()
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid bind_address '{}': use an IP address or 'localhost'",
                self.server.bind_address
            )));
        }

        if self.server.tls.enabled
            && (self.server.tls.cert_file.is_none() || self.server.tls.key_file.is_none())
        {
            return Err(ConfigError::ValidationError(
                "TLS requires both cert_file and key_file".to_string(),
            ));
        }

        if self.upstream.connect_timeout_ms == 0 || self.upstream.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream timeouts must be greater than 0".to_string(),
            ));
        }

        for (family, version) in [
            ("flasharray", &self.upstream.flasharray_api_version),
            ("flashblade", &self.upstream.flashblade_api_version),
        ] {
            if version.is_empty() || version.contains('/') {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid {} API version '{}'",
                    family, version
                )));
            }
        }

        Ok(())
    }
}
