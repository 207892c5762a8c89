//! # Ports Module
//!
//! Hexagonal architecture ports for the Coordinator Session.

pub mod inbound;
pub mod outbound;

pub use inbound::SessionApi;
pub use outbound::{ShardDataSource, StatementRenderer};
