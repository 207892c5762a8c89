//! # Domain Entities
//!
//! Coordinator configuration and read-only snapshots of transaction state.

use serde::{Deserialize, Serialize};
use shared_types::ShardIndex;

use super::value_objects::{GlobalStatus, PhaseExecution, XaState, Xid};

/// Coordinator behaviour switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How each phase is issued across participants.
    pub phase_execution: PhaseExecution,
    /// Issue `forget` after a successful one-phase commit as well.
    pub forget_after_one_phase: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            phase_execution: PhaseExecution::Sequential,
            forget_after_one_phase: true,
        }
    }
}

/// Snapshot of one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Shard the branch runs on.
    pub shard: ShardIndex,
    /// Branch id.
    pub xid: Xid,
    /// Current state.
    pub state: XaState,
    /// Sticky rollback-only flag.
    pub rollback_only: bool,
}

/// Snapshot of a global transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Global transaction id, hex encoded.
    pub gtrid: String,
    /// Global status.
    pub status: GlobalStatus,
    /// Participants in ascending shard order.
    pub participants: Vec<ParticipantInfo>,
}

impl TransactionInfo {
    /// Enlisted shards in ascending order.
    pub fn shards(&self) -> Vec<ShardIndex> {
        self.participants.iter().map(|p| p.shard).collect()
    }
}
