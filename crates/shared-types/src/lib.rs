//! # Shared Types Crate
//!
//! This crate contains the data-model types used by every Shard-XA subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `ShardIndex`, `Value` and the row parameter
//!   carriers are defined once and shared by routing, transaction and session.
//! - **Opaque Resource Failures**: outbound ports (physical shard connections)
//!   report failures only as [`ResourceError`]; subsystems wrap it in their own
//!   typed errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
