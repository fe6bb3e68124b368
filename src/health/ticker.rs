// src/health/ticker.rs
use super::aggregator::HealthAggregator;
use super::status::HealthReport;
use crate::metrics::MetricsCollector;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, info_span, warn, Instrument};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Running,
    Stopped,
}

/// Background loop re-running the aggregator on a fixed interval.
pub struct HealthTicker {
    aggregator: Arc<HealthAggregator>,
    interval: Duration,
    metrics: Option<Arc<MetricsCollector>>,
    stopped: AtomicBool,
    cycles: AtomicU64,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl HealthTicker {
    pub fn new(
        aggregator: Arc<HealthAggregator>,
        interval: Duration,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            aggregator,
            interval,
            metrics,
            stopped: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Run until [`HealthTicker::shutdown`] is called. The first cycle fires
    /// one interval after start; cycles never overlap and missed ticks are
    /// not replayed.
    pub async fn start(self: Arc<Self>) {
        let span = info_span!("health_ticker", component = "health_ticker");
        self.run().instrument(span).await
    }

    async fn run(&self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!("Starting health ticker with interval: {:?}", self.interval);

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    // A stop signal abandons the cycle in flight.
                    tokio::select! {
                        _ = self.run_cycle() => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
                _ = shutdown_rx.changed() => {}
            }
        }

        self.stopped.store(true, Ordering::SeqCst);
        info!("Health ticker stopped");
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn state(&self) -> TickerState {
        if self.stopped.load(Ordering::SeqCst) {
            TickerState::Stopped
        } else {
            TickerState::Running
        }
    }

    pub fn completed_cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// One probing pass; each dependency gets half the interval at most.
    pub async fn run_cycle(&self) -> HealthReport {
        let deadline = Instant::now() + self.interval / 2;
        let report = self.aggregator.build_report(deadline).await;

        for (name, result) in report.dependencies() {
            if result.is_healthy() {
                info!(
                    dependency = %name,
                    latency_ms = ?result.latency_ms,
                    "{} healthy",
                    name
                );
            } else {
                warn!(
                    dependency = %name,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "{} health check failed",
                    name
                );
            }
        }

        info!(
            status = %report.status(),
            "Health check complete: {} healthy, {} unhealthy",
            report.healthy_count(),
            report.dependencies().len() - report.healthy_count()
        );

        self.cycles.fetch_add(1, Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.record_ticker_cycle();
        }

        report
    }
}
