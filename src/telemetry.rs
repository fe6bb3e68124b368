// src/telemetry.rs
use crate::config::{LogFormat, LoggingConfig};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.directive))?
        .add_directive("hyper=info".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Pretty => builder.try_init().map_err(anyhow::Error::msg)?,
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(anyhow::Error::msg)?,
    }

    Ok(())
}
