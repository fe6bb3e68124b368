// src/health/status.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("healthy"),
            HealthStatus::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Degraded,
}

impl OverallStatus {
    pub fn description(&self) -> &'static str {
        match self {
            OverallStatus::Ok => "System is running and healthy",
            OverallStatus::Degraded => "System is running with one or more unhealthy dependencies",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Ok => "ok",
            OverallStatus::Degraded => "degraded",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing a single dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn healthy(uptime: Option<String>, latency_ms: Option<f64>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            uptime,
            latency_ms,
            checked_at: Utc::now(),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>, latency_ms: Option<f64>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            uptime: None,
            latency_ms,
            checked_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Point-in-time health summary across every registered dependency.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    status: OverallStatus,
    description: &'static str,
    timestamp: DateTime<Utc>,
    uptime: String,
    uptime_seconds: u64,
    dependencies: BTreeMap<String, ProbeResult>,
}

impl HealthReport {
    pub fn new(dependencies: BTreeMap<String, ProbeResult>, uptime: Duration) -> Self {
        let status = if dependencies.values().all(ProbeResult::is_healthy) {
            OverallStatus::Ok
        } else {
            OverallStatus::Degraded
        };

        Self {
            status,
            description: status.description(),
            timestamp: Utc::now(),
            uptime: format_uptime(uptime),
            uptime_seconds: uptime.as_secs(),
            dependencies,
        }
    }

    pub fn status(&self) -> OverallStatus {
        self.status
    }

    pub fn description(&self) -> &str {
        self.description
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn uptime(&self) -> &str {
        &self.uptime
    }

    pub fn dependencies(&self) -> &BTreeMap<String, ProbeResult> {
        &self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&ProbeResult> {
        self.dependencies.get(name)
    }

    pub fn healthy_count(&self) -> usize {
        self.dependencies.values().filter(|r| r.is_healthy()).count()
    }
}

/// Render a duration truncated to whole seconds, e.g. `2h3m0s`, `4m5s`, `12s`.
pub fn format_uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        let report = HealthReport::new(BTreeMap::new(), Duration::from_secs(3));
        assert_eq!(report.status(), OverallStatus::Ok);
        assert_eq!(report.description(), OverallStatus::Ok.description());
        assert!(report.dependencies().is_empty());
    }

    #[test]
    fn one_unhealthy_dependency_degrades_report() {
        let mut results = BTreeMap::new();
        results.insert("postgres".to_string(), ProbeResult::healthy(None, None));
        results.insert("redis".to_string(), ProbeResult::unhealthy("refused", None));

        let report = HealthReport::new(results, Duration::ZERO);
        assert_eq!(report.status(), OverallStatus::Degraded);
        assert_eq!(report.healthy_count(), 1);
    }

    #[test]
    fn formats_uptime_like_durations() {
        assert_eq!(format_uptime(Duration::from_millis(900)), "0s");
        assert_eq!(format_uptime(Duration::from_secs(245)), "4m5s");
        assert_eq!(format_uptime(Duration::from_secs(7380)), "2h3m0s");
    }

    #[test]
    fn serializes_report_fields() {
        let mut results = BTreeMap::new();
        results.insert(
            "minio".to_string(),
            ProbeResult::healthy(Some("2h3m".to_string()), Some(12.5)),
        );

        let report = HealthReport::new(results, Duration::from_secs(61));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["uptime"], "1m1s");
        assert_eq!(json["dependencies"]["minio"]["status"], "healthy");
        assert_eq!(json["dependencies"]["minio"]["uptime"], "2h3m");
        assert_eq!(json["dependencies"]["minio"]["latency_ms"], 12.5);
        assert!(json["dependencies"]["minio"].get("error").is_none());
    }
}
