//! # Adapters Module
//!
//! In-memory data source and a placeholder statement renderer.

pub mod in_memory_data_source;
pub mod plain_renderer;

pub use in_memory_data_source::InMemoryDataSource;
pub use plain_renderer::PlainRenderer;
