//! # Adapters Module
//!
//! Outbound adapter implementations.

pub mod in_memory_connection;

pub use in_memory_connection::{
    InMemoryResourceManager, InMemoryXaConnection, XaCall, XaVerb, XAER_NOTA, XAER_PROTO,
    XAER_RMFAIL,
};
