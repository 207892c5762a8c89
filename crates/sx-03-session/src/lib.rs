//! # SX-03 Coordinator Session
//!
//! Ties routing and XA coordination together for one application session.
//!
//! **Subsystem ID:** 03  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Route each statement to its shard and enlist that shard on first use
//! - Partition batch statements, dispatch one sub-batch per shard and hand
//!   back per-row results in the caller's order
//! - Commit or roll back the global transaction, finishing it on close
//!
//! ## Guarantees
//!
//! | Rule | Description |
//! |------|-------------|
//! | Lazy enlistment | Only shards a statement touches join the transaction |
//! | All or nothing | An unroutable batch row means no shard is contacted |
//! | Read-only | Writing statements never reach a shard in a read-only transaction |
//! | Closed is final | Every call after `close` fails with `Closed` |
//!
//! ## Module Structure
//!
//! ```text
//! sx-03-session/
//! ├── domain/          # SessionConfig, StatementResult, SessionError
//! ├── algorithms/      # Batch result reassembly
//! ├── ports/           # SessionApi + ShardDataSource, StatementRenderer
//! ├── adapters/        # In-memory data source, plain renderer
//! └── application/     # CoordinatorSession
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryDataSource, PlainRenderer};
pub use algorithms::reassemble_batch_results;
pub use application::CoordinatorSession;
pub use domain::{SessionConfig, SessionError, StatementResult};
pub use ports::{SessionApi, ShardDataSource, StatementRenderer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
