//! Session configuration.

use serde::{Deserialize, Serialize};
use std::env;
use sx_02_xa_transaction::{CoordinatorConfig, PhaseExecution, TransactionOptions};

/// Coordinator session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Branch timeout handed to every participant at `start`
    pub transaction_timeout_secs: u64,
    /// Sequential or concurrent phase calls
    pub phase_execution: PhaseExecution,
    /// Drive a one-phase committed branch through `forget` as well
    pub forget_after_one_phase: bool,
    /// Count routing and commit outcomes into the metrics registry
    pub record_metrics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transaction_timeout_secs: 60,
            phase_execution: PhaseExecution::Sequential,
            forget_after_one_phase: true,
            record_metrics: true,
        }
    }
}

impl SessionConfig {
    /// Short timeouts, no metrics.
    pub fn for_testing() -> Self {
        Self {
            transaction_timeout_secs: 5,
            phase_execution: PhaseExecution::Sequential,
            forget_after_one_phase: true,
            record_metrics: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `SX_TXN_TIMEOUT_SECS`: branch timeout (default: 60)
    /// - `SX_PHASE_EXECUTION`: `sequential` or `concurrent` (default: sequential)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transaction_timeout_secs: env::var("SX_TXN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.transaction_timeout_secs),
            phase_execution: env::var("SX_PHASE_EXECUTION")
                .ok()
                .and_then(|v| parse_phase_execution(&v))
                .unwrap_or(defaults.phase_execution),
            ..defaults
        }
    }

    /// Coordinator settings derived from this configuration.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            phase_execution: self.phase_execution,
            forget_after_one_phase: self.forget_after_one_phase,
        }
    }

    /// Default transaction options with the configured timeout.
    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions::default().with_timeout_secs(self.transaction_timeout_secs)
    }
}

fn parse_phase_execution(value: &str) -> Option<PhaseExecution> {
    match value.trim().to_lowercase().as_str() {
        "sequential" => Some(PhaseExecution::Sequential),
        "concurrent" => Some(PhaseExecution::Concurrent),
        _ => None,
    }
}
