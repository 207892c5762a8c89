//! # Inbound Ports
//!
//! API trait defining what the Shard Routing subsystem can do.

use shared_types::ShardIndex;

use crate::domain::{BatchRoute, BatchStatement, RouteError, RouteKey, RouteLevel, Statement};

/// Route resolver API - inbound port.
pub trait RouteResolverApi: Send + Sync {
    /// Resolve a non-batch statement to its route key.
    ///
    /// Batch statements fail with [`RouteError::BatchStatement`]; use
    /// [`RouteResolverApi::partition_batch`] for them.
    fn resolve(&self, statement: &Statement, level: RouteLevel) -> Result<RouteKey, RouteError>;

    /// Translate a route key into an index at `level` through the shard router.
    fn shard_of(&self, key: &RouteKey, level: RouteLevel) -> Result<ShardIndex, RouteError>;

    /// Resolve a non-batch statement straight to its shard index.
    fn resolve_shard(
        &self,
        statement: &Statement,
        level: RouteLevel,
    ) -> Result<ShardIndex, RouteError> {
        let key = self.resolve(statement, level)?;
        self.shard_of(&key, level)
    }

    /// Assign every batch row to a shard.
    ///
    /// Fails as a whole if any row is unresolved or the assignment is not an
    /// exact partition of the rows.
    fn partition_batch(
        &self,
        batch: &BatchStatement,
        level: RouteLevel,
    ) -> Result<BatchRoute, RouteError>;
}
