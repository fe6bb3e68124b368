// src/adapters/mod.rs
mod http;
mod mongo;
mod postgres;
mod redis;
mod tcp;

pub use http::HttpDependency;
pub use mongo::MongoDependency;
pub use postgres::PostgresDependency;
pub use redis::RedisDependency;
pub use tcp::TcpDependency;

use crate::config::{DependencyConfig, DependencyKind};
use crate::health::Dependency;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for establishing a client connection, shared by all adapters.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the adapter for one configured dependency. Does not connect.
pub async fn from_config(config: &DependencyConfig) -> Result<Arc<dyn Dependency>> {
    let dependency: Arc<dyn Dependency> = match &config.kind {
        DependencyKind::Tcp { address } => Arc::new(TcpDependency::new(address.clone())),
        DependencyKind::Postgres { url } => Arc::new(
            PostgresDependency::new(url, CONNECT_TIMEOUT)
                .context("Failed to create PostgreSQL pool")?,
        ),
        DependencyKind::Mongo { uri } => Arc::new(
            MongoDependency::new(uri, CONNECT_TIMEOUT)
                .await
                .context("Failed to create MongoDB client")?,
        ),
        DependencyKind::Redis {
            address,
            password,
            db,
        } => Arc::new(
            RedisDependency::new(address, password.as_deref(), *db)
                .context("Failed to create Redis client")?,
        ),
        DependencyKind::Http { url, detailed } => Arc::new(
            HttpDependency::new(url.clone(), *detailed).context("Failed to create HTTP client")?,
        ),
    };

    Ok(dependency)
}
