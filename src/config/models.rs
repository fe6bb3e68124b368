// src/config/models.rs
use crate::health::{DEFAULT_PROBE_CEILING, DEFAULT_TICK_INTERVAL};
use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// Longest accepted tick interval.
const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;
/// Longest accepted probe ceiling or retry delay.
const MAX_WAIT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dependencies: HashMap<String, DependencyConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.health.validate()?;

        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            bail!("metrics.path must start with '/': {}", self.metrics.path);
        }

        for (name, dependency) in &self.dependencies {
            if name.trim().is_empty() {
                bail!("dependency names must not be empty");
            }
            dependency
                .validate()
                .map_err(|e| e.context(format!("invalid dependency '{}'", name)))?;
        }

        Ok(())
    }

    /// Dependencies that should be registered, skipping disabled entries.
    pub fn enabled_dependencies(&self) -> impl Iterator<Item = (&String, &DependencyConfig)> {
        self.dependencies.iter().filter(|(_, dep)| dep.enabled)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_ceiling_secs")]
    pub probe_ceiling_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            probe_ceiling_secs: default_probe_ceiling_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_ceiling(&self) -> Duration {
        Duration::from_secs(self.probe_ceiling_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 || self.interval_secs > MAX_INTERVAL_SECS {
            bail!("health.interval_secs must be between 1 and {}", MAX_INTERVAL_SECS);
        }
        if self.probe_ceiling_secs == 0 || self.probe_ceiling_secs > MAX_WAIT_SECS {
            bail!("health.probe_ceiling_secs must be between 1 and {}", MAX_WAIT_SECS);
        }
        if self.retry_attempts == 0 {
            bail!("health.retry_attempts must be at least 1");
        }
        if self.retry_delay_secs > MAX_WAIT_SECS {
            bail!("health.retry_delay_secs must be at most {}", MAX_WAIT_SECS);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_directive")]
    pub directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directive: default_log_directive(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
    #[serde(default = "default_connect_retry_delay_secs")]
    pub connect_retry_delay_secs: u64,
    #[serde(flatten)]
    pub kind: DependencyKind,
}

impl DependencyConfig {
    pub fn connect_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.connect_retries.max(1),
            delay: Duration::from_secs(self.connect_retry_delay_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.connect_retry_delay_secs > MAX_WAIT_SECS {
            bail!("connect_retry_delay_secs must be at most {}", MAX_WAIT_SECS);
        }

        match &self.kind {
            DependencyKind::Tcp { address } | DependencyKind::Redis { address, .. } => {
                if address.trim().is_empty() {
                    bail!("address must not be empty");
                }
            }
            DependencyKind::Postgres { url } | DependencyKind::Mongo { uri: url } => {
                if url.trim().is_empty() {
                    bail!("connection string must not be empty");
                }
            }
            DependencyKind::Http { url, .. } => {
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("unsupported url scheme '{}'", url.scheme());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyKind {
    /// Plain TCP reachability.
    Tcp { address: String },
    /// Relational database, checked with `SELECT 1`.
    Postgres { url: String },
    /// Document store, checked with `ping`; reports server uptime.
    Mongo { uri: String },
    Redis {
        address: String,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        db: Option<u32>,
    },
    /// HTTP health endpoint (search index, object store).
    Http {
        url: Url,
        #[serde(default)]
        detailed: bool,
    },
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_interval_secs() -> u64 {
    DEFAULT_TICK_INTERVAL.as_secs()
}

fn default_probe_ceiling_secs() -> u64 {
    DEFAULT_PROBE_CEILING.as_secs()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_log_directive() -> String {
    "storefront_health=info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_retries() -> u32 {
    5
}

fn default_connect_retry_delay_secs() -> u64 {
    2
}
