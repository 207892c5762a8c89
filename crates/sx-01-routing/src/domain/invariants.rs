//! # Domain Invariants
//!
//! Rules that every route decision must satisfy before a shard is touched.

use shared_types::ShardIndex;

use super::errors::RouteError;
use super::value_objects::BatchRoute;

/// Invariant: a batch route partitions `{0 .. row_count-1}` exactly once.
///
/// Any missing, duplicated or out-of-range row index fails the whole batch.
pub fn invariant_exact_partition(route: &BatchRoute) -> Result<(), RouteError> {
    let assigned = route.assigned_rows();
    if assigned != route.row_count {
        return Err(RouteError::BatchMismatch {
            expected: route.row_count,
            actual: assigned,
        });
    }

    let mut seen = vec![false; route.row_count];
    for rows in route.groups.values() {
        for &row in rows {
            match seen.get_mut(row) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(RouteError::BatchMismatch {
                        expected: route.row_count,
                        actual: assigned,
                    })
                }
            }
        }
    }

    Ok(())
}

/// Invariant: a resolved shard index lies inside the router's range.
pub fn invariant_shard_in_range(shard: ShardIndex, shard_count: u32) -> Result<(), RouteError> {
    if u32::from(shard) >= shard_count {
        return Err(RouteError::ShardOutOfRange { shard, shard_count });
    }
    Ok(())
}

/// Invariant: routing is deterministic.
///
/// Same input routed twice yields the same shard.
pub fn invariant_deterministic_route<T, F>(route_fn: F, input: &T) -> bool
where
    F: Fn(&T) -> Result<ShardIndex, RouteError>,
{
    route_fn(input) == route_fn(input)
}
