//! # Domain Value Objects
//!
//! Immutable value types for XA transactions: identifiers, statuses and the
//! per-branch state machine table.

use serde::{Deserialize, Serialize};
use shared_types::ShardIndex;
use std::fmt;
use uuid::Uuid;

use super::errors::XaError;

/// Maximum global transaction id length (X/Open XA `MAXGTRIDSIZE`).
pub const MAX_GTRID_SIZE: usize = 64;

/// Branch qualifier length: the big-endian shard index.
pub const BQUAL_SIZE: usize = 2;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Global transaction id: opaque bytes shared by every branch of one logical
/// transaction.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gtrid(Vec<u8>);

impl Gtrid {
    /// Generate a fresh id from a random UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().as_bytes().to_vec())
    }

    /// Wrap caller-supplied bytes (1..=64 bytes).
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, XaError> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > MAX_GTRID_SIZE {
            return Err(XaError::InvalidXid(format!(
                "gtrid must be 1..={} bytes, got {}",
                MAX_GTRID_SIZE,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Gtrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Gtrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gtrid({})", self)
    }
}

/// XA branch identifier: gtrid plus a branch qualifier derived from the shard
/// index.
///
/// Equality is by value; two shards of one global transaction never collide
/// because their qualifiers differ.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    format_id: i32,
    gtrid: Gtrid,
    bqual: [u8; BQUAL_SIZE],
}

impl Xid {
    /// Format id stamped on every branch ("SX").
    pub const FORMAT_ID: i32 = 0x5358;

    /// Branch of `gtrid` on `shard`.
    pub fn new(gtrid: Gtrid, shard: ShardIndex) -> Self {
        Self {
            format_id: Self::FORMAT_ID,
            gtrid,
            bqual: shard.to_be_bytes(),
        }
    }

    /// Format id.
    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    /// Global transaction id.
    pub fn gtrid(&self) -> &Gtrid {
        &self.gtrid
    }

    /// Branch qualifier bytes.
    pub fn bqual(&self) -> &[u8] {
        &self.bqual
    }

    /// Shard this branch belongs to.
    pub fn shard(&self) -> ShardIndex {
        ShardIndex::from_be_bytes(self.bqual)
    }

    /// Deterministic byte encoding: `len(gtrid) ‖ gtrid ‖ bqual`.
    ///
    /// The length prefix keeps ids with different gtrid lengths apart.
    pub fn encode(&self) -> Vec<u8> {
        let gtrid = self.gtrid.as_bytes();
        let mut out = Vec::with_capacity(1 + gtrid.len() + BQUAL_SIZE);
        out.push(gtrid.len() as u8);
        out.extend_from_slice(gtrid);
        out.extend_from_slice(&self.bqual);
        out
    }

    /// Inverse of [`Xid::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, XaError> {
        let (&len, rest) = bytes
            .split_first()
            .ok_or_else(|| XaError::InvalidXid("empty encoding".to_string()))?;
        let len = len as usize;
        if rest.len() != len + BQUAL_SIZE {
            return Err(XaError::InvalidXid(format!(
                "expected {} bytes after length prefix, got {}",
                len + BQUAL_SIZE,
                rest.len()
            )));
        }
        let gtrid = Gtrid::from_bytes(&rest[..len])?;
        let bqual = [rest[len], rest[len + 1]];
        Ok(Self {
            format_id: Self::FORMAT_ID,
            gtrid,
            bqual,
        })
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.gtrid, self.shard())
    }
}

impl fmt::Debug for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xid({})", self)
    }
}

// =============================================================================
// PARTICIPANT STATE MACHINE
// =============================================================================

/// Operation on a participant (XA branch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XaOp {
    /// `xa_start`.
    Start,
    /// `xa_end`.
    End,
    /// `xa_prepare`.
    Prepare,
    /// `xa_commit` with the one-phase flag.
    CommitOnePhase,
    /// `xa_commit`.
    Commit,
    /// `xa_rollback`.
    Rollback,
    /// `xa_forget`.
    Forget,
    /// Set the sticky rollback-only flag.
    MarkRollbackOnly,
    /// Run a statement inside the branch.
    Execute,
}

impl fmt::Display for XaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Prepare => "prepare",
            Self::CommitOnePhase => "commit_one_phase",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Forget => "forget",
            Self::MarkRollbackOnly => "mark_rollback_only",
            Self::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Participant (XA branch) status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum XaState {
    /// Created, not started.
    #[default]
    NotActive,
    /// Associated with the branch; statements may run.
    Active,
    /// `end` in flight.
    Idling,
    /// Dissociated, ready for prepare / one-phase commit.
    Idle,
    /// `end` failed. Only rollback moves forward.
    FailedIdle,
    /// `prepare` in flight.
    Preparing,
    /// Prepared; must eventually be committed or rolled back.
    Prepared,
    /// `prepare` failed. Only rollback moves forward.
    FailedPrepare,
    /// `commit` in flight.
    Committing,
    /// Committed.
    Committed,
    /// `commit` failed; retriable.
    FailedCommit,
    /// `rollback` in flight.
    RollingBack,
    /// Rolled back.
    RolledBack,
    /// `rollback` failed; retriable.
    FailedRollback,
    /// `forget` in flight.
    Forgetting,
    /// Forgotten; terminal.
    Forgot,
    /// `forget` failed; retriable.
    FailedForget,
}

impl fmt::Display for XaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// State changes of one legal operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Status while the physical call is in flight.
    pub in_progress: XaState,
    /// Status after success.
    pub success: XaState,
    /// Status after a resource failure.
    pub failure: XaState,
}

impl Transition {
    const fn new(in_progress: XaState, success: XaState, failure: XaState) -> Self {
        Self {
            in_progress,
            success,
            failure,
        }
    }
}

impl XaState {
    /// Transition table. `None` means `op` is illegal from this state.
    ///
    /// FAILED_IDLE and FAILED_PREPARE never re-enter `end`/`prepare`; their
    /// only way forward is `rollback`.
    pub fn transition(self, op: XaOp) -> Option<Transition> {
        use XaState::*;
        match (op, self) {
            (XaOp::Start, NotActive) => Some(Transition::new(NotActive, Active, NotActive)),
            (XaOp::End, Active) => Some(Transition::new(Idling, Idle, FailedIdle)),
            (XaOp::Prepare, Idle) => Some(Transition::new(Preparing, Prepared, FailedPrepare)),
            (XaOp::CommitOnePhase, Idle) => {
                Some(Transition::new(Committing, Committed, FailedCommit))
            }
            (XaOp::Commit, Prepared | FailedCommit) => {
                Some(Transition::new(Committing, Committed, FailedCommit))
            }
            (
                XaOp::Rollback,
                Prepared | FailedCommit | FailedIdle | FailedPrepare | FailedRollback,
            ) => Some(Transition::new(RollingBack, RolledBack, FailedRollback)),
            (XaOp::Forget, Committed | RolledBack | FailedForget) => {
                Some(Transition::new(Forgetting, Forgot, FailedForget))
            }
            _ => None,
        }
    }

    /// Check if `op` is legal from this state.
    pub fn permits(self, op: XaOp) -> bool {
        match op {
            XaOp::MarkRollbackOnly | XaOp::Execute => self == XaState::Active,
            _ => self.transition(op).is_some(),
        }
    }

    /// Check if this is a FAILED_* state.
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            Self::FailedIdle
                | Self::FailedPrepare
                | Self::FailedCommit
                | Self::FailedRollback
                | Self::FailedForget
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(self) -> bool {
        self == Self::Forgot
    }
}

// =============================================================================
// GLOBAL TRANSACTION
// =============================================================================

/// Global transaction status, owned by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GlobalStatus {
    /// Not begun.
    #[default]
    NotActive,
    /// Running; participants may enlist.
    Active,
    /// Rollback-only; commit fails without touching a resource manager.
    MarkedRollback,
    /// Commit in progress.
    Committing,
    /// Committed.
    Committed,
    /// A commit phase failed; commit or rollback may be retried.
    FailedCommit,
    /// Rollback in progress.
    RollingBack,
    /// Rolled back.
    RolledBack,
    /// A rollback phase failed; rollback may be retried.
    FailedRollback,
}

impl GlobalStatus {
    /// Check if the transaction reached a final outcome.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for GlobalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Commit protocol chosen for a global transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitProtocol {
    /// Single participant: end + commit(one-phase).
    OnePhase,
    /// Several participants: end, prepare, commit, forget.
    TwoPhase,
}

impl fmt::Display for CommitProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnePhase => f.write_str("one_phase"),
            Self::TwoPhase => f.write_str("two_phase"),
        }
    }
}

/// Transaction isolation requested at branch start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum IsolationLevel {
    /// Resource manager default.
    #[default]
    Default,
    /// READ UNCOMMITTED.
    ReadUncommitted,
    /// READ COMMITTED.
    ReadCommitted,
    /// REPEATABLE READ.
    RepeatableRead,
    /// SERIALIZABLE.
    Serializable,
}

/// Options of one global transaction, applied to every branch at `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Branch timeout handed to each resource manager.
    pub timeout_secs: u64,
    /// Read-only branches skip every physical XA call.
    pub read_only: bool,
    /// Isolation level.
    pub isolation: IsolationLevel,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            read_only: false,
            isolation: IsolationLevel::Default,
        }
    }
}

impl TransactionOptions {
    /// Read-only options with the default timeout.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Replace the timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// How a phase is issued across participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PhaseExecution {
    /// One participant after another, ascending shard index.
    #[default]
    Sequential,
    /// All participants at once; the phase still completes before the next
    /// one starts.
    Concurrent,
}
