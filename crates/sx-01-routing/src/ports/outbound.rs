//! # Outbound Ports
//!
//! The shard router: the injected, process-wide function that maps a route
//! value to a shard index. It is configuration, not part of this subsystem.

use shared_types::{ShardIndex, Value};

use crate::domain::{RouteError, RouteLevel};

/// Shard router - outbound port.
///
/// Implementations must be pure and deterministic, and are read-only after
/// process startup (shared as `Arc<dyn ShardRouter>` without locking).
pub trait ShardRouter: Send + Sync {
    /// Number of shards (level `DataSource`) or physical tables per shard
    /// (level `Table`).
    fn shard_count(&self, level: RouteLevel) -> u32;

    /// Map a route-field value of `table` to an index at `level`.
    fn shard_index(
        &self,
        level: RouteLevel,
        table: &str,
        value: &Value,
    ) -> Result<ShardIndex, RouteError>;
}
