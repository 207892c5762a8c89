//! # Ports Module
//!
//! Hexagonal architecture ports for the XA Transaction subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::GlobalTransactionApi;
pub use outbound::XaConnection;
