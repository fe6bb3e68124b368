// src/health/prober.rs
use super::dependency::{Dependency, DependencyError, HealthDetails};
use super::status::ProbeResult;
use crate::metrics::MetricsCollector;
use crate::retry::{RetryDecision, RetryStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

pub const DEFAULT_PROBE_CEILING: Duration = Duration::from_secs(5);

/// Probes a single dependency within a bounded deadline.
#[derive(Clone)]
pub struct Prober {
    ceiling: Duration,
    retry: RetryStrategy,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROBE_CEILING,
            RetryStrategy::new(3, Duration::from_secs(2)),
        )
    }
}

impl Prober {
    pub fn new(ceiling: Duration, retry: RetryStrategy) -> Self {
        Self {
            ceiling,
            retry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Never fails: a dependency error is recorded in the returned result.
    pub async fn probe(&self, name: &str, dependency: &dyn Dependency, deadline: Instant) -> ProbeResult {
        let start = Instant::now();
        let deadline = deadline.min(start + self.ceiling);

        let result = match dependency.details() {
            Some(details) => self.probe_detailed(name, details, start, deadline).await,
            None => self.probe_basic(name, dependency, start, deadline).await,
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(name, &result, start.elapsed());
        }

        result
    }

    async fn probe_detailed(
        &self,
        name: &str,
        details: &dyn HealthDetails,
        start: Instant,
        deadline: Instant,
    ) -> ProbeResult {
        let outcome = match timeout_at(deadline, details.health_details()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DependencyError::DeadlineExceeded(start.elapsed())),
        };

        match outcome {
            Ok(diagnostics) => {
                info!(
                    dependency = name,
                    uptime = %diagnostics.uptime,
                    latency_ms = diagnostics.latency_ms,
                    elapsed_ms = elapsed_ms(start),
                    "Dependency healthy"
                );
                ProbeResult::healthy(Some(diagnostics.uptime), Some(diagnostics.latency_ms))
            }
            Err(error) => {
                let latency = elapsed_ms(start);
                warn!(
                    dependency = name,
                    latency_ms = latency,
                    %error,
                    "Dependency diagnostics failed"
                );
                ProbeResult::unhealthy(error.to_string(), Some(latency))
            }
        }
    }

    async fn probe_basic(
        &self,
        name: &str,
        dependency: &dyn Dependency,
        start: Instant,
        deadline: Instant,
    ) -> ProbeResult {
        let delay = self.retry.delay();

        let outcome = self
            .retry
            .execute_with_decision(
                || async move {
                    match timeout_at(deadline, dependency.health_check()).await {
                        Ok(result) => result,
                        Err(_) => Err(DependencyError::DeadlineExceeded(start.elapsed())),
                    }
                },
                // Never start an attempt that could only time out.
                |error| match error {
                    DependencyError::DeadlineExceeded(_) | DependencyError::Closed => {
                        RetryDecision::NoRetry
                    }
                    _ if Instant::now() + delay >= deadline => RetryDecision::NoRetry,
                    _ => RetryDecision::Retry,
                },
            )
            .await;

        match outcome {
            Ok(()) => {
                info!(dependency = name, elapsed_ms = elapsed_ms(start), "Dependency healthy");
                ProbeResult::healthy(None, None)
            }
            Err(error) => {
                warn!(
                    dependency = name,
                    elapsed_ms = elapsed_ms(start),
                    %error,
                    "Dependency health check failed"
                );
                ProbeResult::unhealthy(error.to_string(), None)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{Diagnostics, HealthStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Dependency for Flaky {
        async fn health_check(&self) -> Result<(), DependencyError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(DependencyError::Connection(format!("attempt {}", n)))
            } else {
                Ok(())
            }
        }

        async fn close(&self) -> Result<(), DependencyError> {
            Ok(())
        }
    }

    struct Detailed(Result<Diagnostics, DependencyError>);

    #[async_trait]
    impl Dependency for Detailed {
        async fn health_check(&self) -> Result<(), DependencyError> {
            panic!("basic path must not be used when diagnostics are available");
        }

        async fn close(&self) -> Result<(), DependencyError> {
            Ok(())
        }

        fn details(&self) -> Option<&dyn HealthDetails> {
            Some(self)
        }
    }

    #[async_trait]
    impl HealthDetails for Detailed {
        async fn health_details(&self) -> Result<Diagnostics, DependencyError> {
            self.0.clone()
        }
    }

    struct Hanging;

    #[async_trait]
    impl Dependency for Hanging {
        async fn health_check(&self) -> Result<(), DependencyError> {
            std::future::pending().await
        }

        async fn close(&self) -> Result<(), DependencyError> {
            Ok(())
        }
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[tokio::test(start_paused = true)]
    async fn basic_probe_recovers_within_retries() {
        let dep = Flaky { failures: 2, calls: AtomicU32::new(0) };
        let result = Prober::default().probe("postgres", &dep, far_deadline()).await;

        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(dep.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn basic_probe_reports_last_error() {
        let dep = Flaky { failures: u32::MAX, calls: AtomicU32::new(0) };
        let result = Prober::default().probe("redis", &dep, far_deadline()).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.error.as_deref(), Some("connection failed: attempt 3"));
        assert_eq!(dep.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn detailed_probe_propagates_diagnostics() {
        let dep = Detailed(Ok(Diagnostics {
            uptime: "2h3m".to_string(),
            latency_ms: 12.5,
        }));
        let result = Prober::default().probe("mongo", &dep, far_deadline()).await;

        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(result.uptime.as_deref(), Some("2h3m"));
        assert_eq!(result.latency_ms, Some(12.5));
    }

    #[tokio::test(start_paused = true)]
    async fn detailed_failure_records_latency() {
        let dep = Detailed(Err(DependencyError::Protocol("no serverStatus".to_string())));
        let result = Prober::default().probe("mongo", &dep, far_deadline()).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(result.latency_ms.is_some());
        assert_eq!(result.error.as_deref(), Some("unexpected response: no serverStatus"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_check_is_bounded_by_ceiling() {
        let start = Instant::now();
        let result = Prober::default().probe("opensearch", &Hanging, far_deadline()).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(result.error.unwrap().starts_with("deadline exceeded"));
        assert!(start.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn caller_deadline_tighter_than_ceiling_wins() {
        let start = Instant::now();
        let deadline = start + Duration::from_secs(1);
        let result = Prober::default().probe("opensearch", &Hanging, deadline).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
