//! Application configuration loaded from environment variables.
//!
//! # Core Settings
//!
//! - `PORT`: HTTP listen port (default: `3333`)
//! - `KAFKA`: Kafka bootstrap address (default: `localhost:9092`)
//! - `TOPIC`: Topic messages are published to (default: `my-topic`)
//!
//! These three never fail to load: an absent or empty variable selects the
//! default, and a present value is taken verbatim.
//!
//! # Operational Tuning
//!
//! - `HOST`: Bind address (default: `0.0.0.0`)
//! - `PUBLISH_WORKERS`: Publish jobs running at once (default: 8)
//! - `SHUTDOWN_TIMEOUT_SECS`: Grace period for in-flight jobs (default: 10)
//! - `KAFKA_METADATA_TIMEOUT_MS`: Partition lookup timeout (default: 5000)
//! - `METRICS_PORT`: Prometheus exporter port, 0 disables (default: 0)
//!
//! `RUST_LOG` is not part of `Config`; the tracing subscriber reads it
//! directly in `main`.

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PORT: &str = "3333";
pub const DEFAULT_KAFKA_ADDRESS: &str = "localhost:9092";
pub const DEFAULT_TOPIC: &str = "my-topic";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port, kept as given; an unusable value fails at bind time
    pub port: String,

    // =========================================================================
    // Kafka Configuration
    // =========================================================================
    /// Bootstrap broker address
    pub kafka_address: String,

    /// Topic every message is published to
    pub topic: String,

    /// Timeout for the one-off partition metadata lookup
    pub metadata_timeout: Duration,

    // =========================================================================
    // Publish Pool Configuration
    // =========================================================================
    /// Maximum number of publish jobs running concurrently
    pub publish_workers: usize,

    /// How long shutdown waits for in-flight jobs before cancelling them
    pub shutdown_timeout: Duration,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Port for Prometheus metrics endpoint (0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if an operational setting is invalid
    /// (e.g., non-numeric `PUBLISH_WORKERS`). `PORT`, `KAFKA` and `TOPIC`
    /// never produce an error.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            // Server
            host: or_default(&lookup, "HOST", "0.0.0.0"),
            port: or_default(&lookup, "PORT", DEFAULT_PORT),

            // Kafka
            kafka_address: or_default(&lookup, "KAFKA", DEFAULT_KAFKA_ADDRESS),
            topic: or_default(&lookup, "TOPIC", DEFAULT_TOPIC),
            metadata_timeout: Duration::from_millis(parse_var(
                &lookup,
                "KAFKA_METADATA_TIMEOUT_MS",
                5000,
            )?),

            // Publish pool
            publish_workers: parse_var(&lookup, "PUBLISH_WORKERS", 8)?,
            shutdown_timeout: Duration::from_secs(parse_var(
                &lookup,
                "SHUTDOWN_TIMEOUT_SECS",
                10,
            )?),

            // Observability
            metrics_port: parse_var(&lookup, "METRICS_PORT", 0)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    fn validate(&self) -> AppResult<()> {
        if self.publish_workers == 0 {
            return Err(AppError::ConfigError(
                "PUBLISH_WORKERS must be greater than 0".to_string(),
            ));
        }

        if self.metadata_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "KAFKA_METADATA_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }
}

/// Read a variable, treating absent and empty the same way.
fn or_default<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a variable into the specified type with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(val) => val
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT.to_string(),
            kafka_address: DEFAULT_KAFKA_ADDRESS.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            metadata_timeout: Duration::from_secs(5),
            publish_workers: 8,
            shutdown_timeout: Duration::from_secs(10),
            metrics_port: 0,
        }
    }
}
