//! # Batch Result Reassembly
//!
//! Puts per-shard sub-batch results back into the caller's row order.

use shared_types::ShardIndex;
use std::collections::BTreeMap;
use sx_01_routing::BatchRoute;

use crate::domain::SessionError;

/// Merge per-shard affected-row counts into one vector indexed by original
/// row position.
///
/// `results[shard][i]` belongs to row `route.groups[shard][i]`.
pub fn reassemble_batch_results(
    route: &BatchRoute,
    results: &BTreeMap<ShardIndex, Vec<u64>>,
) -> Result<Vec<u64>, SessionError> {
    let mut merged = vec![0u64; route.row_count];
    for (shard, rows) in &route.groups {
        let counts = results.get(shard).map(Vec::as_slice).unwrap_or(&[]);
        if counts.len() != rows.len() {
            return Err(SessionError::BatchResultMismatch {
                shard: *shard,
                expected: rows.len(),
                actual: counts.len(),
            });
        }
        for (row, count) in rows.iter().zip(counts) {
            merged[*row] = *count;
        }
    }
    Ok(merged)
}
