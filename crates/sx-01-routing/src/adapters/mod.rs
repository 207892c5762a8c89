//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for routing.

mod in_memory_router;

pub use in_memory_router::InMemoryShardRouter;
