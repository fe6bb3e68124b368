// src/lib.rs
pub mod adapters;
pub mod config;
pub mod health;
pub mod metrics;
pub mod registry;
pub mod retry;
pub mod server;
pub mod telemetry;
