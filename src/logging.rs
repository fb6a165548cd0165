//! Tracing subscriber setup shared by the binaries

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Crates whose events pass the default filter: the library and its binaries
const LOG_TARGETS: [&str; 4] = ["chd_risk_pipeline", "chd_risk_server", "chd_train", "chd_synth"];

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(config: &LoggingConfig) -> String {
    let level = config.level.to_lowercase();
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed or the directive does not parse.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_directive(config)),
    }
    .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}
