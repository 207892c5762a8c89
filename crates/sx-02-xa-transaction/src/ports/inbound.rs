//! # Inbound Ports
//!
//! API the session drives a global transaction through.

use async_trait::async_trait;
use shared_types::ShardIndex;

use crate::domain::{GlobalStatus, ParticipantInfo, XaError};
use crate::ports::outbound::XaConnection;

/// Global transaction API.
#[async_trait]
pub trait GlobalTransactionApi: Send {
    /// NOT_ACTIVE → ACTIVE.
    fn begin(&mut self) -> Result<(), XaError>;

    /// Start a branch for `shard` on `connection` and add it to the
    /// participant set. Only legal while ACTIVE.
    async fn enlist(
        &mut self,
        shard: ShardIndex,
        connection: Box<dyn XaConnection>,
    ) -> Result<(), XaError>;

    /// One-phase commit for a single participant, full 2PC otherwise.
    async fn commit(&mut self) -> Result<(), XaError>;

    /// Drive every participant to rolled back and forgotten.
    async fn rollback(&mut self) -> Result<(), XaError>;

    /// ACTIVE → MARKED_ROLLBACK.
    fn mark_rollback_only(&mut self) -> Result<(), XaError>;

    /// Current global status.
    fn status(&self) -> GlobalStatus;

    /// Per-participant snapshot in ascending shard order.
    fn participant_statuses(&self) -> Vec<ParticipantInfo>;
}
