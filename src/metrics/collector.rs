// src/metrics/collector.rs
use crate::health::{HealthReport, ProbeResult};
use anyhow::Result;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,
    pub dependency_up: IntGaugeVec,
    pub dependency_latency_ms: GaugeVec,

    // Report metrics
    pub reports_total: IntCounterVec,
    pub healthy_dependencies: IntGauge,
    pub total_dependencies: IntGauge,
    pub ticker_cycles_total: IntCounter,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("health_probes_total", "Total number of dependency probes"),
            &["dependency", "status"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "health_probe_duration_seconds",
                "Wall time spent probing a dependency, retries included",
            ),
            &["dependency"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let dependency_up = IntGaugeVec::new(
            Opts::new(
                "health_dependency_up",
                "Dependency health status (1=healthy, 0=unhealthy)",
            ),
            &["dependency"],
        )?;
        registry.register(Box::new(dependency_up.clone()))?;

        let dependency_latency_ms = GaugeVec::new(
            Opts::new(
                "health_dependency_latency_ms",
                "Latency reported by dependencies exposing diagnostics",
            ),
            &["dependency"],
        )?;
        registry.register(Box::new(dependency_latency_ms.clone()))?;

        let reports_total = IntCounterVec::new(
            Opts::new("health_reports_total", "Health reports built, by overall status"),
            &["status"],
        )?;
        registry.register(Box::new(reports_total.clone()))?;

        let healthy_dependencies = IntGauge::new(
            "health_healthy_dependencies",
            "Number of healthy dependencies in the last report",
        )?;
        registry.register(Box::new(healthy_dependencies.clone()))?;

        let total_dependencies = IntGauge::new(
            "health_total_dependencies",
            "Number of dependencies in the last report",
        )?;
        registry.register(Box::new(total_dependencies.clone()))?;

        let ticker_cycles_total = IntCounter::new(
            "health_ticker_cycles_total",
            "Completed periodic health check cycles",
        )?;
        registry.register(Box::new(ticker_cycles_total.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            dependency_up,
            dependency_latency_ms,
            reports_total,
            healthy_dependencies,
            total_dependencies,
            ticker_cycles_total,
        })
    }

    pub fn record_probe(&self, dependency: &str, result: &ProbeResult, elapsed: Duration) {
        let status = result.status.to_string();
        self.probes_total
            .with_label_values(&[dependency, &status])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[dependency])
            .observe(elapsed.as_secs_f64());

        self.dependency_up
            .with_label_values(&[dependency])
            .set(i64::from(result.is_healthy()));

        if let Some(latency) = result.latency_ms {
            self.dependency_latency_ms
                .with_label_values(&[dependency])
                .set(latency);
        }
    }

    pub fn record_report(&self, report: &HealthReport) {
        self.reports_total
            .with_label_values(&[report.status().as_str()])
            .inc();
        self.healthy_dependencies.set(report.healthy_count() as i64);
        self.total_dependencies
            .set(report.dependencies().len() as i64);
    }

    pub fn record_ticker_cycle(&self) {
        self.ticker_cycles_total.inc();
    }
}
