//! # Guardian Telemetry
//!
//! Observability for the guardian node.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with env-filter, plain or JSON output
//! - **Metrics**: Prometheus counters and gauges in a dedicated registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardian_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GUARDIAN_SERVICE_NAME` | `guardian-node` | Service name in logs |
//! | `GUARDIAN_LOG_LEVEL` | `info` | Log level filter |
//! | `GUARDIAN_JSON_LOGS` | `false` | JSON log output |
//! | `GUARDIAN_NETWORK` | `devnet` | Network name |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;

    init_logging(config)?;

    Ok(TelemetryGuard {
        metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Metrics handle owned by this guard.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
