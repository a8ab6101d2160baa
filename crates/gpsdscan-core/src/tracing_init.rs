//! Shared tracing/logging initialization.
//!
//! Logs always go to stderr: stdout of the `gpsdscan` binary carries the
//! record stream and must not be interleaved with diagnostics.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Build the filter: `RUST_LOG` when set, otherwise `log.level`.
pub fn env_filter(log: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level))
}

/// Install the global tracing subscriber.
///
/// Fails when a global subscriber is already set, which lets tests and
/// embedding applications call it without aborting.
pub fn init_tracing(log: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(log));
    let installed = if log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
