// src/registry/once.rs
use super::dependencies::DependencyRegistry;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// One-time construction barrier for the registry.
///
/// The first caller runs the initializer; concurrent callers wait for it and
/// then share the same registry. A failed initialization leaves the cell empty
/// and its error goes to the caller that ran it; the binary treats it as fatal.
#[derive(Default)]
pub struct RegistryCell {
    cell: OnceCell<Arc<DependencyRegistry>>,
}

impl RegistryCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<DependencyRegistry>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DependencyRegistry>>,
    {
        self.cell
            .get_or_try_init(|| async move { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<DependencyRegistry>> {
        self.cell.get().cloned()
    }
}
