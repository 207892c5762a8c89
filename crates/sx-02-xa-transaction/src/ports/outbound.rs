//! # Outbound Ports
//!
//! The physical XA connection to one shard.

use async_trait::async_trait;
use shared_types::{ExecOutcome, ResourceError, SqlBatch, SqlCommand};

use crate::domain::{TransactionOptions, Xid};

/// One shard's XA-capable connection.
///
/// Every call is blocking I/O against the shard's resource manager. The
/// participant owning the connection is the only caller, so methods take
/// `&mut self`.
#[async_trait]
pub trait XaConnection: Send + Sync {
    /// Associate the connection with branch `xid`.
    async fn start(&mut self, xid: &Xid, options: &TransactionOptions)
        -> Result<(), ResourceError>;

    /// Dissociate the connection from `xid`.
    async fn end(&mut self, xid: &Xid) -> Result<(), ResourceError>;

    /// First phase: ask the resource manager to vote.
    async fn prepare(&mut self, xid: &Xid) -> Result<(), ResourceError>;

    /// Second phase, or a one-phase commit when `one_phase` is set.
    async fn commit(&mut self, xid: &Xid, one_phase: bool) -> Result<(), ResourceError>;

    /// Roll the branch back.
    async fn rollback(&mut self, xid: &Xid) -> Result<(), ResourceError>;

    /// Discard the resource manager's knowledge of a completed branch.
    async fn forget(&mut self, xid: &Xid) -> Result<(), ResourceError>;

    /// Run one statement inside the active branch.
    async fn execute(&mut self, command: &SqlCommand) -> Result<ExecOutcome, ResourceError>;

    /// Run one statement once per parameter row. Returns affected rows per
    /// row, in input order.
    async fn execute_batch(&mut self, batch: &SqlBatch) -> Result<Vec<u64>, ResourceError>;
}
