//! # SX-02 XA Transaction
//!
//! Drives XA branches on individual shards and coordinates them as one
//! global transaction.
//!
//! **Subsystem ID:** 02  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Model one XA branch per shard (`XaParticipant`) with a strict state
//!   machine: illegal transitions never reach the resource manager
//! - Commit a global transaction with one-phase commit for a single
//!   participant and full two-phase commit otherwise
//! - Roll back every participant, including branches parked in a failed
//!   state
//!
//! ## Guarantees
//!
//! | Rule | Description |
//! |------|-------------|
//! | Barrier | Every participant finishes phase N before any starts phase N+1 |
//! | No silent failure | A FAILED_* state is always paired with a returned error |
//! | No retry at end/prepare | FAILED_IDLE and FAILED_PREPARE only lead to rollback |
//! | Rollback-only | Commit fails before any resource manager is contacted |
//! | Unique branches | Branch qualifier is the shard index |
//!
//! ## Module Structure
//!
//! ```text
//! sx-02-xa-transaction/
//! ├── domain/          # Xid, Gtrid, XaState table, GlobalStatus, XaError
//! ├── algorithms/      # XaParticipant, phase barrier
//! ├── ports/           # GlobalTransactionApi + XaConnection
//! ├── adapters/        # Recording in-memory resource manager
//! └── application/     # TransactionCoordinator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryResourceManager, InMemoryXaConnection, XaCall, XaVerb};
pub use algorithms::{run_phase, PhaseOutcome, XaParticipant};
pub use application::TransactionCoordinator;
pub use domain::{
    invariant_all_prepared, invariant_one_phase_reached, invariant_rollback_undecided,
    CommitProtocol, CoordinatorConfig,
    GlobalStatus, Gtrid, IsolationLevel, ParticipantInfo, PhaseExecution, TransactionInfo,
    TransactionOptions, Transition, XaError, XaOp, XaState, Xid, MAX_GTRID_SIZE,
};
pub use ports::{GlobalTransactionApi, XaConnection};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
