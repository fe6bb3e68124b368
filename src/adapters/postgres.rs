// src/adapters/postgres.rs
use crate::health::{Dependency, DependencyError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Relational database handle. A small lazy pool; each check runs `SELECT 1`.
pub struct PostgresDependency {
    pool: PgPool,
}

impl PostgresDependency {
    pub fn new(url: &str, acquire_timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Dependency for PostgresDependency {
    async fn health_check(&self) -> Result<(), DependencyError> {
        if self.pool.is_closed() {
            return Err(DependencyError::Closed);
        }

        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), DependencyError> {
        self.pool.close().await;
        Ok(())
    }
}
