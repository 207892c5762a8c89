//! Route Resolver Service
//!
//! Main service implementing `RouteResolverApi` on top of an injected
//! `ShardRouter`.

use shared_types::ShardIndex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::algorithms::{partition_rows, resolve_route};
use crate::domain::{
    invariant_shard_in_range, BatchRoute, BatchStatement, RouteError, RouteKey, RouteLevel,
    Statement,
};
use crate::ports::inbound::RouteResolverApi;
use crate::ports::outbound::ShardRouter;

/// Route Resolver
///
/// Resolution pipeline:
/// 1. Find the route key (predicate, explicit index, sub-query)
/// 2. Translate value keys through the shard router
/// 3. Check the index against the router's shard count
#[derive(Clone)]
pub struct RouteResolver {
    router: Arc<dyn ShardRouter>,
}

impl RouteResolver {
    /// Create a resolver over `router`.
    pub fn new(router: Arc<dyn ShardRouter>) -> Self {
        Self { router }
    }

    /// The injected shard router.
    pub fn router(&self) -> &Arc<dyn ShardRouter> {
        &self.router
    }
}

impl RouteResolverApi for RouteResolver {
    fn resolve(&self, statement: &Statement, level: RouteLevel) -> Result<RouteKey, RouteError> {
        match resolve_route(statement, level) {
            Ok(key) => {
                debug!(statement = %statement, key = %key, "[sx-01] Route resolved");
                Ok(key)
            }
            Err(err) => {
                warn!(statement = %statement, error = %err, "[sx-01] Route resolution failed");
                Err(err)
            }
        }
    }

    fn shard_of(&self, key: &RouteKey, level: RouteLevel) -> Result<ShardIndex, RouteError> {
        let (shard, level) = match key {
            RouteKey::Index(index) => (*index, level),
            RouteKey::Value {
                level: key_level,
                table,
                value,
                ..
            } => (self.router.shard_index(*key_level, table, value)?, *key_level),
        };
        invariant_shard_in_range(shard, self.router.shard_count(level))?;
        Ok(shard)
    }

    fn partition_batch(
        &self,
        batch: &BatchStatement,
        level: RouteLevel,
    ) -> Result<BatchRoute, RouteError> {
        let route = partition_rows(batch, level, |key| self.shard_of(key, level))?;
        debug!(
            table = batch.table.name(),
            rows = route.row_count,
            shards = route.groups.len(),
            "[sx-01] Batch partitioned"
        );
        Ok(route)
    }
}
