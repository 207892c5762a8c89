//! # Application Layer
//!
//! Service orchestration for the Shard Routing subsystem.

pub mod service;

pub use service::RouteResolver;
