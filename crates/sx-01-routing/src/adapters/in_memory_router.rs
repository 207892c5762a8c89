//! In-Memory Shard Router Adapter
//!
//! Implements `ShardRouter` as an explicit lookup table.
//!
//! Production routers (hash or range functions) are injected configuration;
//! this adapter only maps values the caller registered up front.

use parking_lot::RwLock;
use shared_types::{ShardIndex, Value};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::domain::{RouteError, RouteLevel};
use crate::ports::outbound::ShardRouter;

type LookupKey = (RouteLevel, String);

/// Lookup-table shard router for tests and fixed deployments.
pub struct InMemoryShardRouter {
    shard_count: u32,
    table_count: u32,
    /// Exact value assignments per (level, table).
    exact: RwLock<HashMap<LookupKey, HashMap<Value, ShardIndex>>>,
    /// Integer range assignments per (level, table), checked in insert order.
    ranges: RwLock<HashMap<LookupKey, Vec<(RangeInclusive<i64>, ShardIndex)>>>,
}

impl InMemoryShardRouter {
    /// Create a router over `shard_count` shards, one physical table each.
    pub fn new(shard_count: u32) -> Self {
        Self::with_tables(shard_count, 1)
    }

    /// Create a router with `table_count` physical tables per shard.
    pub fn with_tables(shard_count: u32, table_count: u32) -> Self {
        Self {
            shard_count,
            table_count,
            exact: RwLock::new(HashMap::new()),
            ranges: RwLock::new(HashMap::new()),
        }
    }

    /// Map one value of `table` to `index`.
    pub fn assign(
        &self,
        level: RouteLevel,
        table: &str,
        value: impl Into<Value>,
        index: ShardIndex,
    ) -> &Self {
        self.exact
            .write()
            .entry((level, table.to_string()))
            .or_default()
            .insert(value.into(), index);
        self
    }

    /// Map an inclusive integer range of `table` to `index`.
    pub fn assign_range(
        &self,
        level: RouteLevel,
        table: &str,
        range: RangeInclusive<i64>,
        index: ShardIndex,
    ) -> &Self {
        self.ranges
            .write()
            .entry((level, table.to_string()))
            .or_default()
            .push((range, index));
        self
    }
}

impl ShardRouter for InMemoryShardRouter {
    fn shard_count(&self, level: RouteLevel) -> u32 {
        match level {
            RouteLevel::DataSource => self.shard_count,
            RouteLevel::Table => self.table_count,
        }
    }

    fn shard_index(
        &self,
        level: RouteLevel,
        table: &str,
        value: &Value,
    ) -> Result<ShardIndex, RouteError> {
        let key = (level, table.to_string());

        if let Some(index) = self
            .exact
            .read()
            .get(&key)
            .and_then(|values| values.get(value))
        {
            return Ok(*index);
        }

        if let Some(v) = value.as_int() {
            if let Some((_, index)) = self
                .ranges
                .read()
                .get(&key)
                .and_then(|ranges| ranges.iter().find(|(range, _)| range.contains(&v)))
            {
                return Ok(*index);
            }
        }

        debug!("[sx-01] No {} route for {} = {}", level, table, value);
        Err(RouteError::Router(format!(
            "no {} route registered for {} = {}",
            level, table, value
        )))
    }
}
