//! Tracing subscriber setup
//!
//! Libraries in this workspace only emit events. Binaries and test suites
//! that want them on stderr call [`init_tracing`] once at startup.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Subscriber settings, read from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: std::env::var("UIWELL_LOG")
                .unwrap_or_else(|_| "uiwell=debug,info".to_string()),
            json: std::env::var("UIWELL_LOG_FORMAT")
                .map(|s| s == "json")
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to init tracing subscriber: {0}")]
pub struct TelemetryError(String);

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| TelemetryError(e.to_string()))?;

    tracing::info!(
        filter = %config.default_filter,
        json = config.json,
        "Telemetry initialized"
    );
    Ok(())
}
