// src/adapters/http.rs
use crate::health::{format_uptime, Dependency, DependencyError, Diagnostics, HealthDetails};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use url::Url;

use super::CONNECT_TIMEOUT;

/// Health endpoint over HTTP (OpenSearch `_cluster/health`, MinIO
/// `/minio/health/live`, ...). Any non-2xx status is unhealthy.
pub struct HttpDependency {
    url: Url,
    client: Client,
    detailed: bool,
    created_at: Instant,
    closed: AtomicBool,
}

impl HttpDependency {
    pub fn new(url: Url, detailed: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        Ok(Self {
            url,
            client,
            detailed,
            created_at: Instant::now(),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Dependency for HttpDependency {
    async fn health_check(&self) -> Result<(), DependencyError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DependencyError::Closed);
        }

        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DependencyError::Status(status.as_u16()))
        }
    }

    async fn close(&self) -> Result<(), DependencyError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn details(&self) -> Option<&dyn HealthDetails> {
        if self.detailed {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl HealthDetails for HttpDependency {
    /// Latency of the health request; uptime since this adapter was created.
    async fn health_details(&self) -> Result<Diagnostics, DependencyError> {
        let start = Instant::now();
        self.health_check().await?;

        Ok(Diagnostics {
            uptime: format_uptime(self.created_at.elapsed()),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
