//! # SX-01 Shard Routing
//!
//! Decides which shard(s) must execute a statement.
//!
//! **Subsystem ID:** 01  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Resolve single-table, multi-table and insert-from-query statements to
//!   exactly one route key
//! - Partition named-parameter batches into per-shard row groups
//! - Translate route keys into shard indexes through the injected
//!   `ShardRouter`
//!
//! ## Guarantees
//!
//! | Rule | Description |
//! |------|-------------|
//! | Predicate first | A route-field equality beats an explicit index |
//! | Table order | In joins, table order outranks predicate order |
//! | All or nothing | One unroutable batch row fails the whole batch |
//! | Exact partition | Batch groups cover every row exactly once |
//!
//! ## Module Structure
//!
//! ```text
//! sx-01-routing/
//! ├── domain/          # Statement shapes, RouteKey, BatchRoute, RouteError
//! ├── algorithms/      # Route resolution, batch partitioning
//! ├── ports/           # RouteResolverApi + ShardRouter
//! ├── adapters/        # In-memory lookup router
//! └── application/     # RouteResolver service
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::InMemoryShardRouter;
pub use algorithms::{find_predicate_route, partition_rows, resolve_route, row_route_key};
pub use application::RouteResolver;
pub use domain::{
    invariant_deterministic_route, invariant_exact_partition, invariant_shard_in_range,
    BatchRoute, BatchStatement, ColumnRef, MultiTableStatement, Predicate, RouteError, RouteKey,
    RouteLevel, SingleTableStatement, Statement, StatementKind, SubQuery,
    SubQueryInsertStatement, TableItem, TableMeta, TableRef,
};
pub use ports::{RouteResolverApi, ShardRouter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
