//! # Domain Entities
//!
//! Results returned to session callers.

use serde::{Deserialize, Serialize};
use shared_types::{Row, ShardIndex};

/// Result of executing one statement through the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatementResult {
    /// Shards the statement ran on, ascending.
    pub shards: Vec<ShardIndex>,
    /// Affected rows: one entry for a single statement, one per row (in
    /// caller order) for a batch.
    pub affected_rows: Vec<u64>,
    /// Rows returned by a query.
    pub rows: Vec<Row>,
}

impl StatementResult {
    /// Sum of affected rows.
    pub fn total_affected(&self) -> u64 {
        self.affected_rows.iter().sum()
    }
}
