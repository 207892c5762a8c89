//! # Domain Errors
//!
//! Error types for the Shard Routing subsystem.
//!
//! Every variant is raised before any shard is touched: a routing failure
//! never reaches a resource manager.

use shared_types::ShardIndex;
use thiserror::Error;

use super::value_objects::RouteLevel;

/// Routing error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route-field predicate, explicit index or sub-query route was found.
    #[error("Route not found for {statement} statement at {level} level")]
    NotFound {
        /// Statement shape that failed to route.
        statement: &'static str,
        /// Route level that was being resolved.
        level: RouteLevel,
    },

    /// A batch row has no non-null value for any route field.
    #[error("Route not found for batch row {row} of table {table}")]
    UnresolvedRow {
        /// Row index in the original batch.
        row: usize,
        /// Target table.
        table: String,
    },

    /// Resolved row routes do not partition the batch exactly once each.
    #[error("Batch route mismatch: {actual} routed rows for {expected} batch rows")]
    BatchMismatch {
        /// Number of rows in the batch.
        expected: usize,
        /// Number of row assignments produced.
        actual: usize,
    },

    /// Batch statement with no rows.
    #[error("Batch statement for table {0} has no rows")]
    EmptyBatch(String),

    /// A batch statement was given to a single-route operation.
    #[error("Batch statement for table {0} must be partitioned, not resolved to one route")]
    BatchStatement(String),

    /// Resolved index is outside the configured shard range.
    #[error("Shard {shard} out of range (shard count {shard_count})")]
    ShardOutOfRange {
        /// Resolved index.
        shard: ShardIndex,
        /// Number of shards at the resolved level.
        shard_count: u32,
    },

    /// The injected shard router rejected the route value.
    #[error("Router error: {0}")]
    Router(String),
}

impl RouteError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::UnresolvedRow { .. } => "not_found",
            Self::BatchMismatch { .. } | Self::EmptyBatch(_) | Self::BatchStatement(_) => {
                "batch_mismatch"
            }
            Self::ShardOutOfRange { .. } | Self::Router(_) => "router",
        }
    }
}
