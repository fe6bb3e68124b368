// src/health/mod.rs
mod aggregator;
mod dependency;
mod prober;
mod status;
mod ticker;

pub use aggregator::HealthAggregator;
pub use dependency::{Dependency, DependencyError, Diagnostics, HealthDetails};
pub use prober::{Prober, DEFAULT_PROBE_CEILING};
pub use status::{format_uptime, HealthReport, HealthStatus, OverallStatus, ProbeResult};
pub use ticker::{HealthTicker, TickerState, DEFAULT_TICK_INTERVAL};
