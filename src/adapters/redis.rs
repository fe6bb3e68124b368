// src/adapters/redis.rs
use crate::health::{format_uptime, Dependency, DependencyError, Diagnostics, HealthDetails};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, ErrorKind, FromRedisValue, InfoDict, RedisError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Redis cache handle. One multiplexed connection is shared by every probe and
/// reopened after an I/O failure. `AUTH`/`SELECT` run on connect.
pub struct RedisDependency {
    client: Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    closed: AtomicBool,
}

impl RedisDependency {
    pub fn new(address: &str, password: Option<&str>, db: Option<u32>) -> Result<Self, RedisError> {
        let url = connection_url(address, password, db)?;

        Ok(Self {
            client: Client::open(url.as_str())?,
            connection: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, DependencyError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DependencyError::Closed);
        }

        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!(address = ?self.client.get_connection_info().addr, "Redis connection opened");
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, DependencyError> {
        let mut conn = self.connection().await?;

        match cmd.query_async(&mut conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_io_error() || e.is_connection_dropped() {
                    self.connection.lock().await.take();
                }
                Err(e.into())
            }
        }
    }

    async fn ping(&self) -> Result<(), DependencyError> {
        let pong: String = self.query(&redis::cmd("PING")).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(DependencyError::Protocol(format!("PING returned {}", pong)))
        }
    }
}

#[async_trait]
impl Dependency for RedisDependency {
    async fn health_check(&self) -> Result<(), DependencyError> {
        self.ping().await
    }

    async fn close(&self) -> Result<(), DependencyError> {
        self.closed.store(true, Ordering::SeqCst);
        self.connection.lock().await.take();
        Ok(())
    }

    fn details(&self) -> Option<&dyn HealthDetails> {
        Some(self)
    }
}

#[async_trait]
impl HealthDetails for RedisDependency {
    async fn health_details(&self) -> Result<Diagnostics, DependencyError> {
        let start = Instant::now();
        self.ping().await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut info = redis::cmd("INFO");
        info.arg("server");
        let info: InfoDict = self.query(&info).await?;
        let uptime = info
            .get::<u64>("uptime_in_seconds")
            .map(Duration::from_secs)
            .ok_or_else(|| DependencyError::Protocol("INFO has no uptime_in_seconds".to_string()))?;

        Ok(Diagnostics {
            uptime: format_uptime(uptime),
            latency_ms,
        })
    }
}

fn connection_url(address: &str, password: Option<&str>, db: Option<u32>) -> Result<Url, RedisError> {
    let invalid = || RedisError::from((ErrorKind::InvalidClientConfig, "invalid redis address"));

    let mut url = Url::parse(&format!("redis://{}", address)).map_err(|_| invalid())?;
    if let Some(password) = password {
        url.set_password(Some(password)).map_err(|_| invalid())?;
    }
    if let Some(db) = db {
        url.set_path(&db.to_string());
    }
    Ok(url)
}
