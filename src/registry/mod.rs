// src/registry/mod.rs
mod bootstrap;
mod dependencies;
mod once;

pub use bootstrap::connect_registry;
pub use dependencies::DependencyRegistry;
pub use once::RegistryCell;
