//! # Domain Errors
//!
//! Error types for the XA Transaction subsystem.

use shared_types::{ResourceError, ShardIndex};
use thiserror::Error;

use super::value_objects::{GlobalStatus, XaOp, XaState, Xid};

/// XA transaction error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XaError {
    /// A participant operation was requested from a state that does not allow
    /// it. No resource manager was contacted.
    #[error("Illegal {op} on branch {xid} in state {state}")]
    IllegalState {
        /// Branch the operation targeted.
        xid: Xid,
        /// Requested operation.
        op: XaOp,
        /// State at the time of the request.
        state: XaState,
    },

    /// A global transaction operation was requested from a status that does
    /// not allow it.
    #[error("Illegal {op} on global transaction in status {status}")]
    IllegalStatus {
        /// Requested operation.
        op: &'static str,
        /// Status at the time of the request.
        status: GlobalStatus,
    },

    /// The resource manager failed the physical call. After a phase call the
    /// branch is in the matching FAILED_* state.
    #[error("XA {op} failed on branch {xid}: {source}")]
    Failure {
        /// Branch that failed.
        xid: Xid,
        /// Operation that failed.
        op: XaOp,
        /// Driver failure.
        #[source]
        source: ResourceError,
    },

    /// Commit was requested but the transaction is rollback-only. No
    /// resource manager was contacted.
    #[error("Transaction {0} is marked rollback-only")]
    RollbackOnly(String),

    /// The shard has no participant in this transaction.
    #[error("Shard {0} is not enlisted")]
    NotEnlisted(ShardIndex),

    /// The shard already has a participant in this transaction.
    #[error("Shard {0} is already enlisted")]
    AlreadyEnlisted(ShardIndex),

    /// Malformed transaction identifier.
    #[error("Invalid xid: {0}")]
    InvalidXid(String),
}

impl XaError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalState { .. } | Self::IllegalStatus { .. } => "illegal_state",
            Self::Failure { .. } => "failure",
            Self::RollbackOnly(_) => "rollback_only",
            Self::NotEnlisted(_) | Self::AlreadyEnlisted(_) => "enlistment",
            Self::InvalidXid(_) => "invalid_xid",
        }
    }

    /// Operation that failed at the resource manager, if any.
    pub fn failed_op(&self) -> Option<XaOp> {
        match self {
            Self::Failure { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Check if the error is a resource failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
