// src/adapters/tcp.rs
use crate::health::{Dependency, DependencyError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;

/// Reachability check for services without a health protocol of their own:
/// a successful TCP handshake counts as healthy.
#[derive(Debug)]
pub struct TcpDependency {
    address: String,
    closed: AtomicBool,
}

impl TcpDependency {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Dependency for TcpDependency {
    async fn health_check(&self) -> Result<(), DependencyError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DependencyError::Closed);
        }

        TcpStream::connect(&self.address)
            .await
            .map(drop)
            .map_err(|e| DependencyError::Connection(format!("{}: {}", self.address, e)))
    }

    async fn close(&self) -> Result<(), DependencyError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
