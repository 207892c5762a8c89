//! # Domain Errors
//!
//! Error types for the Coordinator Session.

use shared_types::{ResourceError, ShardIndex};
use sx_01_routing::RouteError;
use sx_02_xa_transaction::XaError;
use thiserror::Error;

/// Session error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Routing failed; no shard was touched.
    #[error("Routing failed: {0}")]
    Route(#[from] RouteError),

    /// Transaction protocol error or phase failure.
    #[error("Transaction error: {0}")]
    Transaction(#[from] XaError),

    /// A statement failed on a shard.
    #[error("Execution failed on shard {shard}: {source}")]
    Execution {
        /// Shard that ran the statement.
        shard: ShardIndex,
        /// Branch failure.
        #[source]
        source: XaError,
    },

    /// No connection could be opened to a shard.
    #[error("Connection to shard {shard} failed: {source}")]
    Connection {
        /// Target shard.
        shard: ShardIndex,
        /// Driver failure.
        #[source]
        source: ResourceError,
    },

    /// The statement could not be rendered for a shard.
    #[error("Render failed: {0}")]
    Render(String),

    /// A shard returned a different number of batch results than rows sent.
    #[error("Shard {shard} returned {actual} batch results for {expected} rows")]
    BatchResultMismatch {
        /// Shard that ran the sub-batch.
        shard: ShardIndex,
        /// Rows sent.
        expected: usize,
        /// Results returned.
        actual: usize,
    },

    /// The operation needs a running transaction.
    #[error("No transaction in progress")]
    NoTransaction,

    /// `begin` while a transaction is still unfinished.
    #[error("Transaction already in progress")]
    TransactionInProgress,

    /// A writing statement inside a read-only transaction.
    #[error("{0} statement rejected in read-only transaction")]
    ReadOnlyTransaction(String),

    /// The session was closed.
    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Routing error, if this is one.
    pub fn route_error(&self) -> Option<&RouteError> {
        match self {
            Self::Route(err) => Some(err),
            _ => None,
        }
    }

    /// Transaction error, if this wraps one.
    pub fn xa_error(&self) -> Option<&XaError> {
        match self {
            Self::Transaction(err) | Self::Execution { source: err, .. } => Some(err),
            _ => None,
        }
    }
}
