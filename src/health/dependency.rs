// src/health/dependency.rs
use async_trait::async_trait;
use std::time::Duration;

/// Capability boundary every monitored data store adapter implements.
///
/// Implementations must tolerate concurrent `health_check` calls: the ticker
/// and on-demand reports probe the same handle without coordination.
#[async_trait]
pub trait Dependency: Send + Sync {
    async fn health_check(&self) -> Result<(), DependencyError>;

    async fn close(&self) -> Result<(), DependencyError>;

    /// Establish the initial connection at startup. Defaults to a health check.
    async fn connect(&self) -> Result<(), DependencyError> {
        self.health_check().await
    }

    /// Extended diagnostics, if this adapter supports them.
    fn details(&self) -> Option<&dyn HealthDetails> {
        None
    }
}

/// Optional capability: uptime and latency reported by the dependency itself.
#[async_trait]
pub trait HealthDetails: Send + Sync {
    async fn health_details(&self) -> Result<Diagnostics, DependencyError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub uptime: String,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DependencyError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("unhealthy status: HTTP {0}")]
    Status(u16),

    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("dependency is closed")]
    Closed,
}

impl From<redis::RedisError> for DependencyError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            DependencyError::Connection(err.to_string())
        } else {
            DependencyError::Protocol(err.to_string())
        }
    }
}

impl From<sqlx::Error> for DependencyError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DependencyError::Connection(err.to_string()),
            other => DependencyError::Protocol(other.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for DependencyError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                DependencyError::Connection(err.to_string())
            }
            _ => DependencyError::Protocol(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DependencyError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => DependencyError::Status(status.as_u16()),
            None => DependencyError::Connection(err.to_string()),
        }
    }
}
