// src/registry/bootstrap.rs
use super::dependencies::DependencyRegistry;
use crate::adapters;
use crate::config::Config;
use crate::health::Dependency;
use crate::retry::RetryStrategy;
use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{info, warn};

/// Build the registry from configuration.
///
/// Adapter construction errors are fatal. Connection errors are not: each
/// dependency gets a bounded number of attempts, and one that never answers is
/// still registered so that it shows up as unhealthy (degraded startup).
pub async fn connect_registry(config: &Config) -> Result<DependencyRegistry> {
    info!(component = "registry", "Setting up dependencies");

    let mut pending = Vec::new();
    for (name, dependency_config) in config.enabled_dependencies() {
        let dependency = adapters::from_config(dependency_config)
            .await
            .with_context(|| format!("Failed to set up dependency '{}'", name))?;
        let retry = RetryStrategy::from_config(dependency_config.connect_retry());
        pending.push((name.clone(), dependency, retry));
    }

    let connects = pending.iter().map(|(name, dependency, retry)| async move {
        establish(name, dependency.as_ref(), retry).await
    });
    let connected = join_all(connects).await.into_iter().filter(|ok| *ok).count();

    let registry = DependencyRegistry::new();
    for (name, dependency, _) in pending {
        registry.register(name, dependency);
    }

    info!(
        component = "registry",
        dependencies = ?registry.names(),
        "Dependency registry ready: {}/{} connected",
        connected,
        registry.len()
    );
    Ok(registry)
}

async fn establish(name: &str, dependency: &dyn Dependency, retry: &RetryStrategy) -> bool {
    match retry.execute(|| dependency.connect()).await {
        Ok(()) => {
            info!(component = "registry", dependency = name, "Dependency connected");
            true
        }
        Err(e) => {
            warn!(
                component = "registry",
                dependency = name,
                attempts = retry.max_attempts(),
                error = %e,
                "Dependency unreachable at startup, continuing degraded"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn registers_reachable_and_unreachable_dependencies() {
        let up = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let down = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let down_addr = down.local_addr().unwrap();
        drop(down);

        let yaml = format!(
            "dependencies:\n  postgres:\n    kind: tcp\n    address: \"{}\"\n  mongo:\n    kind: tcp\n    address: \"{}\"\n    connect_retries: 1\n  search:\n    enabled: false\n    kind: tcp\n    address: \"localhost:9200\"\n",
            up.local_addr().unwrap(),
            down_addr
        );
        let config = parse_config(&yaml, true).unwrap();

        let registry = connect_registry(&config).await.unwrap();

        assert_eq!(registry.names(), vec!["mongo", "postgres"]);
        assert!(registry.get("search").is_none());
    }
}
