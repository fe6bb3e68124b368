// src/main.rs
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Instant;
use tracing::{error, info};

use storefront_health::{
    config,
    health::{HealthAggregator, HealthTicker, Prober},
    metrics::MetricsRegistry,
    registry::{connect_registry, RegistryCell},
    retry::RetryStrategy,
    server::{HealthHandler, MetricsHandler, ServerBuilder},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let started_at = Instant::now();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = config::load_config(&config_path).await?;

    telemetry::init_tracing(&config.logging)?;
    info!("Loaded configuration from: {}", config_path);

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    // Connect dependencies; a failure here ends the process
    let registry_cell = RegistryCell::new();
    let registry = registry_cell
        .get_or_init(|| connect_registry(&config))
        .await
        .context("Dependency registry initialization failed")?;

    let prober = Prober::new(
        config.health.probe_ceiling(),
        RetryStrategy::from_config(config.health.retry()),
    )
    .with_metrics(metrics.clone());

    let aggregator = Arc::new(
        HealthAggregator::new(registry.clone(), prober)
            .with_started_at(started_at)
            .with_metrics(metrics.clone()),
    );

    // Start health ticker
    let ticker = Arc::new(HealthTicker::new(
        aggregator.clone(),
        config.health.interval(),
        Some(metrics.clone()),
    ));
    let ticker_task = tokio::spawn(ticker.clone().start());

    // Start metrics server if enabled
    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        info!(
            "Metrics server listening on http://{}{}",
            metrics_addr, config.metrics.path
        );

        let server = ServerBuilder::new(metrics_addr).with_handler(MetricsHandler::new(
            metrics_registry.clone(),
            config.metrics.path.clone(),
        ));
        tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                error!("Metrics server error: {:#}", e);
            }
        });
    }

    // Serve the health endpoint until a shutdown signal arrives
    info!("Starting health service on {}", config.server.listen);
    let served = ServerBuilder::new(config.server.listen)
        .with_handler(HealthHandler::new(aggregator))
        .with_shutdown(shutdown_signal())
        .serve()
        .await;

    ticker.shutdown();
    if let Err(e) = ticker_task.await {
        error!("Health ticker task failed: {}", e);
    }
    registry.close_all().await;
    info!("Shutdown complete");

    served
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
