// src/adapters/mongo.rs
use crate::health::{format_uptime, Dependency, DependencyError, Diagnostics, HealthDetails};
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Document store handle. Checks run `ping` against `admin`; diagnostics add
/// the server-reported uptime from `serverStatus`.
pub struct MongoDependency {
    client: Client,
    closed: AtomicBool,
}

impl MongoDependency {
    pub async fn new(uri: &str, timeout: Duration) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        Ok(Self {
            client: Client::with_options(options)?,
            closed: AtomicBool::new(false),
        })
    }

    async fn admin_command(&self, command: Document) -> Result<Document, DependencyError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DependencyError::Closed);
        }

        Ok(self.client.database("admin").run_command(command).await?)
    }
}

#[async_trait]
impl Dependency for MongoDependency {
    async fn health_check(&self) -> Result<(), DependencyError> {
        self.admin_command(doc! { "ping": 1 }).await.map(drop)
    }

    async fn close(&self) -> Result<(), DependencyError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.client.clone().shutdown().await;
        }
        Ok(())
    }

    fn details(&self) -> Option<&dyn HealthDetails> {
        Some(self)
    }
}

#[async_trait]
impl HealthDetails for MongoDependency {
    async fn health_details(&self) -> Result<Diagnostics, DependencyError> {
        let start = Instant::now();
        self.health_check().await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let status = self.admin_command(doc! { "serverStatus": 1 }).await?;
        let uptime = server_uptime(&status)
            .ok_or_else(|| DependencyError::Protocol("serverStatus has no uptime".to_string()))?;

        Ok(Diagnostics {
            uptime: format_uptime(uptime),
            latency_ms,
        })
    }
}

/// `uptime` is reported in seconds; its numeric type varies by server version.
fn server_uptime(status: &Document) -> Option<Duration> {
    let secs = match status.get("uptime")? {
        Bson::Double(secs) if *secs >= 0.0 => *secs as u64,
        Bson::Int32(secs) => u64::try_from(*secs).ok()?,
        Bson::Int64(secs) => u64::try_from(*secs).ok()?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn refused_uri() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        format!("mongodb://{}/?directConnection=true", address)
    }

    #[test]
    fn reads_uptime_of_any_numeric_type() {
        assert_eq!(
            server_uptime(&doc! { "uptime": 7380.6 }),
            Some(Duration::from_secs(7380))
        );
        assert_eq!(
            server_uptime(&doc! { "uptime": 42_i32 }),
            Some(Duration::from_secs(42))
        );
        assert_eq!(
            server_uptime(&doc! { "uptime": 42_i64 }),
            Some(Duration::from_secs(42))
        );
        assert_eq!(server_uptime(&doc! { "uptime": "soon" }), None);
        assert_eq!(server_uptime(&doc! { "ok": 1 }), None);
    }

    #[tokio::test]
    async fn rejects_malformed_uri() {
        assert!(MongoDependency::new("localhost:27017", Duration::from_secs(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let dep = MongoDependency::new(&refused_uri().await, Duration::from_millis(300))
            .await
            .unwrap();

        let err = dep.health_check().await.unwrap_err();
        assert!(matches!(err, DependencyError::Connection(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn rejects_checks_after_close() {
        let dep = MongoDependency::new(&refused_uri().await, Duration::from_millis(300))
            .await
            .unwrap();
        dep.close().await.unwrap();

        assert_eq!(dep.health_check().await, Err(DependencyError::Closed));
        assert!(dep.details().unwrap().health_details().await.is_err());
    }
}
