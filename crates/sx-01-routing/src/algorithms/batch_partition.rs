//! # Batch Partition Algorithm
//!
//! Assigns each row of a named-parameter batch to a shard.
//!
//! Every row is resolved before anything is returned, so a single unroutable
//! row fails the whole batch and no partial dispatch can happen.

use shared_types::{ParamCarrier, ShardIndex};

use crate::domain::{
    invariant_exact_partition, BatchRoute, BatchStatement, RouteError, RouteKey, RouteLevel,
    TableRef,
};

/// Route key of one batch row: the first route field (configuration order)
/// with a non-null bound value.
pub fn row_route_key(
    table: &TableRef,
    row: &dyn ParamCarrier,
    level: RouteLevel,
) -> Option<RouteKey> {
    table
        .meta
        .route_fields_for(level)
        .iter()
        .find_map(|field| match row.param(field) {
            Some(value) if !value.is_null() => Some(RouteKey::Value {
                level,
                table: table.name().to_string(),
                field: field.clone(),
                value,
            }),
            _ => None,
        })
}

/// Partition `batch` into per-shard row index lists.
///
/// `shard_fn` translates a row's route key into a shard index.
pub fn partition_rows<F>(
    batch: &BatchStatement,
    level: RouteLevel,
    mut shard_fn: F,
) -> Result<BatchRoute, RouteError>
where
    F: FnMut(&RouteKey) -> Result<ShardIndex, RouteError>,
{
    if batch.rows.is_empty() {
        return Err(RouteError::EmptyBatch(batch.table.name().to_string()));
    }

    let mut route = BatchRoute::new(batch.rows.len());
    for (index, row) in batch.rows.iter().enumerate() {
        let key = row_route_key(&batch.table, row.as_ref(), level).ok_or_else(|| {
            RouteError::UnresolvedRow {
                row: index,
                table: batch.table.name().to_string(),
            }
        })?;
        route.assign(shard_fn(&key)?, index);
    }

    invariant_exact_partition(&route)?;
    Ok(route)
}
