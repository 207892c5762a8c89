//! # Domain Value Objects
//!
//! Immutable value types produced by route resolution.

use serde::{Deserialize, Serialize};
use shared_types::{ShardIndex, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Which of a table's route-field sets is being resolved.
///
/// Data-source level picks the shard (physical database); table level picks
/// the physical table inside a shard. The two field sets may differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RouteLevel {
    /// Shard / database selection.
    #[default]
    DataSource,
    /// Physical table selection within a shard.
    Table,
}

impl fmt::Display for RouteLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataSource => f.write_str("data-source"),
            Self::Table => f.write_str("table"),
        }
    }
}

/// Route decision for one statement.
///
/// A statement resolves to exactly one kind: either an index that was already
/// attached to the statement, or a value that still has to go through the
/// shard router.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteKey {
    /// Pre-resolved shard index (e.g. a literal table reference).
    Index(ShardIndex),
    /// Bound value of a route field, translated by the shard router.
    Value {
        /// Level the field was configured at.
        level: RouteLevel,
        /// Logical table name.
        table: String,
        /// Route field that matched.
        field: String,
        /// Bound value (never NULL).
        value: Value,
    },
}

impl RouteKey {
    /// Check if this key came from a route-field value.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }

    /// The explicit index, if this key is one.
    pub fn explicit_index(&self) -> Option<ShardIndex> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Value { .. } => None,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "index {}", index),
            Self::Value {
                table,
                field,
                value,
                ..
            } => write!(f, "{}.{} = {}", table, field, value),
        }
    }
}

/// Row-to-shard assignment for a batch statement.
///
/// Shards are kept in ascending order and every row index list is ascending,
/// so dispatch order is deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRoute {
    /// Number of rows in the original batch.
    pub row_count: usize,
    /// Row indices per shard.
    pub groups: BTreeMap<ShardIndex, Vec<usize>>,
}

impl BatchRoute {
    /// Create an empty assignment for `row_count` rows.
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            groups: BTreeMap::new(),
        }
    }

    /// Assign `row` to `shard`.
    pub fn assign(&mut self, shard: ShardIndex, row: usize) {
        self.groups.entry(shard).or_default().push(row);
    }

    /// Shards touched by the batch, ascending.
    pub fn shards(&self) -> Vec<ShardIndex> {
        self.groups.keys().copied().collect()
    }

    /// Check if every row landed on the same shard.
    pub fn is_single_shard(&self) -> bool {
        self.groups.len() == 1
    }

    /// Total number of row assignments.
    pub fn assigned_rows(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}
