//! Prometheus metrics for the Shard-XA subsystems.
//!
//! All metrics follow the naming convention: `sx_<metric>_<unit>`.
//! Recording helpers never fail; registration is explicit and idempotent.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ROUTING METRICS (Subsystem 1)
    // =========================================================================

    /// Routing failures by kind
    pub static ref ROUTING_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sx_routing_failures_total", "Statements or batches that failed to route"),
        &["kind"]  // kind: not_found/batch_mismatch/router
    ).expect("metric creation failed");

    /// Batch rows dispatched to shards
    pub static ref BATCH_ROWS_DISPATCHED: Counter = Counter::new(
        "sx_batch_rows_dispatched_total",
        "Total batch rows dispatched after partitioning"
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSACTION METRICS (Subsystem 2)
    // =========================================================================

    /// Participants enlisted
    pub static ref PARTICIPANTS_ENLISTED: Counter = Counter::new(
        "sx_participants_enlisted_total",
        "Total XA branches started"
    ).expect("metric creation failed");

    /// Global transactions by protocol and outcome
    pub static ref TRANSACTIONS: CounterVec = CounterVec::new(
        Opts::new("sx_transactions_total", "Completed global transaction attempts"),
        &["protocol", "outcome"]  // protocol: one_phase/two_phase, outcome: committed/rolled_back/failed
    ).expect("metric creation failed");

    /// Phase failures by XA operation
    pub static ref PHASE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sx_phase_failures_total", "XA phase calls that failed at the resource manager"),
        &["phase"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Routing
        Box::new(ROUTING_FAILURES.clone()),
        Box::new(BATCH_ROWS_DISPATCHED.clone()),
        // Transactions
        Box::new(PARTICIPANTS_ENLISTED.clone()),
        Box::new(TRANSACTIONS.clone()),
        Box::new(PHASE_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Count a routing failure.
pub fn record_routing_failure(kind: &str) {
    ROUTING_FAILURES.with_label_values(&[kind]).inc();
}

/// Count dispatched batch rows.
pub fn record_batch_rows(rows: usize) {
    BATCH_ROWS_DISPATCHED.inc_by(rows as f64);
}

/// Count one enlisted participant.
pub fn record_enlisted() {
    PARTICIPANTS_ENLISTED.inc();
}

/// Count a finished commit or rollback attempt.
pub fn record_transaction(protocol: &str, outcome: &str) {
    TRANSACTIONS.with_label_values(&[protocol, outcome]).inc();
}

/// Count a failed phase call.
pub fn record_phase_failure(phase: &str) {
    PHASE_FAILURES.with_label_values(&[phase]).inc();
}
