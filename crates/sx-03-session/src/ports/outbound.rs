//! # Outbound Ports
//!
//! Dependencies the session needs from the runtime around it.

use async_trait::async_trait;
use shared_types::{ResourceError, ShardIndex, SqlBatch, SqlCommand};
use sx_01_routing::{BatchStatement, Statement};
use sx_02_xa_transaction::XaConnection;

use crate::domain::SessionError;

/// Opens XA-capable connections to shards.
#[async_trait]
pub trait ShardDataSource: Send + Sync {
    /// Open a fresh connection to `shard`. The session hands it to the
    /// participant that will own it.
    async fn connect(&self, shard: ShardIndex) -> Result<Box<dyn XaConnection>, ResourceError>;
}

/// Dialect layer: turns a routed statement into SQL for one shard.
pub trait StatementRenderer: Send + Sync {
    /// Render a non-batch statement for `shard`.
    fn render(&self, statement: &Statement, shard: ShardIndex) -> Result<SqlCommand, SessionError>;

    /// Render the sub-batch made of `rows` (indexes into `batch.rows`, in
    /// ascending order) for `shard`.
    fn render_batch(
        &self,
        batch: &BatchStatement,
        shard: ShardIndex,
        rows: &[usize],
    ) -> Result<SqlBatch, SessionError>;
}
