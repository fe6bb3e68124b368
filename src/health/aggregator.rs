// src/health/aggregator.rs
use super::prober::Prober;
use super::status::HealthReport;
use crate::metrics::MetricsCollector;
use crate::registry::DependencyRegistry;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// Builds health reports over every dependency in the registry.
pub struct HealthAggregator {
    registry: Arc<DependencyRegistry>,
    prober: Prober,
    started_at: Instant,
    metrics: Option<Arc<MetricsCollector>>,
}

impl HealthAggregator {
    pub fn new(registry: Arc<DependencyRegistry>, prober: Prober) -> Self {
        Self {
            registry,
            prober,
            started_at: Instant::now(),
            metrics: None,
        }
    }

    /// Report uptime relative to `started_at` instead of construction time.
    pub fn with_started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    pub fn registry(&self) -> &Arc<DependencyRegistry> {
        &self.registry
    }

    /// Probe every registered dependency concurrently. Dependency failures
    /// end up in the report, never as an error.
    pub async fn build_report(&self, deadline: Instant) -> HealthReport {
        let entries = self.registry.all();

        let probes = entries.iter().map(|(name, dependency)| async move {
            let result = self.prober.probe(name, dependency.as_ref(), deadline).await;
            (name.clone(), result)
        });

        let results: BTreeMap<_, _> = join_all(probes).await.into_iter().collect();
        let report = HealthReport::new(results, self.started_at.elapsed());

        debug!(
            status = %report.status(),
            healthy = report.healthy_count(),
            total = report.dependencies().len(),
            "Health report built"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_report(&report);
        }

        report
    }
}
