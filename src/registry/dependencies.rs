// src/registry/dependencies.rs
use crate::health::Dependency;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Name -> handle mapping for every monitored dependency.
///
/// Populated at startup, read-only afterwards, torn down once by
/// [`DependencyRegistry::close_all`].
#[derive(Default)]
pub struct DependencyRegistry {
    dependencies: DashMap<String, Arc<dyn Dependency>>,
    closed: AtomicBool,
}

impl fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("dependencies", &self.names())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handle for `name`. A replaced handle is handed
    /// back so the caller can close it.
    pub fn register(
        &self,
        name: impl Into<String>,
        dependency: Arc<dyn Dependency>,
    ) -> Option<Arc<dyn Dependency>> {
        let name = name.into();
        let previous = self.dependencies.insert(name.clone(), dependency);

        if previous.is_some() {
            debug!(component = "registry", dependency = %name, "Replaced dependency handle");
        } else {
            debug!(component = "registry", dependency = %name, "Registered dependency");
        }

        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Dependency>> {
        self.dependencies.get(name).map(|entry| entry.value().clone())
    }

    /// Snapshot of every `(name, handle)` pair; call again for a fresh pass.
    pub fn all(&self) -> Vec<(String, Arc<dyn Dependency>)> {
        self.dependencies
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependencies
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close every handle, logging failures without stopping. Only the first
    /// call does any work.
    pub async fn close_all(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut failures = 0;
        for (name, dependency) in self.all() {
            match dependency.close().await {
                Ok(()) => info!(component = "registry", dependency = %name, "Closed dependency"),
                Err(e) => {
                    failures += 1;
                    error!(
                        component = "registry",
                        dependency = %name,
                        error = %e,
                        "Error closing dependency"
                    );
                }
            }
        }

        info!(
            component = "registry",
            "Registry closed: {} dependencies, {} close errors",
            self.len(),
            failures
        );
    }
}
