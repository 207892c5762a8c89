//! # Ports Module
//!
//! Hexagonal architecture ports for the Shard Routing subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::RouteResolverApi;
pub use outbound::ShardRouter;
