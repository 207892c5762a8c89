//! # SX Telemetry
//!
//! Logging and metrics shared by the Shard-XA subsystems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sx_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // sessions now log through tracing and count into the registry
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SX_SERVICE_NAME` | `shard-xa` | Service name |
//! | `SX_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SX_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SX_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_batch_rows, record_enlisted, record_phase_failure,
    record_routing_failure, record_transaction, register_metrics, BATCH_ROWS_DISPATCHED,
    PARTICIPANTS_ENLISTED, PHASE_FAILURES, REGISTRY, ROUTING_FAILURES, TRANSACTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install logging.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
