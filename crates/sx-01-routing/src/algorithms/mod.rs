//! # Algorithms Module
//!
//! Core algorithms for the Shard Routing subsystem.

pub mod batch_partition;
pub mod route_resolution;

pub use batch_partition::{partition_rows, row_route_key};
pub use route_resolution::{find_predicate_route, resolve_route};
