//! # XA Participant
//!
//! One XA branch on one shard, driven through the participant state machine.
//!
//! Each phase call:
//! 1. checks the transition table (illegal → `XaError::IllegalState`, no I/O)
//! 2. moves to the in-progress state
//! 3. issues the physical verb (skipped for read-only branches)
//! 4. settles in the success or FAILED_* state

use shared_types::{ExecOutcome, ShardIndex, SqlBatch, SqlCommand};
use tracing::{debug, warn};

use crate::domain::{ParticipantInfo, TransactionOptions, XaError, XaOp, XaState, Xid};
use crate::ports::outbound::XaConnection;

/// One XA branch.
pub struct XaParticipant {
    xid: Xid,
    state: XaState,
    rollback_only: bool,
    read_only: bool,
    /// Set once a one-phase commit was attempted; retries reuse the flag.
    one_phase: bool,
    options: TransactionOptions,
    connection: Box<dyn XaConnection>,
}

impl XaParticipant {
    /// Create a NOT_ACTIVE branch on `connection`.
    pub fn new(xid: Xid, options: TransactionOptions, connection: Box<dyn XaConnection>) -> Self {
        Self {
            xid,
            state: XaState::NotActive,
            rollback_only: false,
            read_only: options.read_only,
            one_phase: false,
            options,
            connection,
        }
    }

    /// Branch id.
    pub fn xid(&self) -> &Xid {
        &self.xid
    }

    /// Shard the branch runs on.
    pub fn shard(&self) -> ShardIndex {
        self.xid.shard()
    }

    /// Current state.
    pub fn state(&self) -> XaState {
        self.state
    }

    /// Check if the rollback-only flag is set.
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Check if physical XA calls are skipped.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Snapshot for diagnostics.
    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            shard: self.shard(),
            xid: self.xid.clone(),
            state: self.state,
            rollback_only: self.rollback_only,
        }
    }

    /// NOT_ACTIVE → ACTIVE.
    pub async fn start(&mut self) -> Result<(), XaError> {
        self.drive(XaOp::Start).await
    }

    /// ACTIVE → IDLE.
    pub async fn end(&mut self) -> Result<(), XaError> {
        self.drive(XaOp::End).await
    }

    /// IDLE → PREPARED.
    pub async fn prepare(&mut self) -> Result<(), XaError> {
        self.drive(XaOp::Prepare).await
    }

    /// IDLE → COMMITTED without a prepare vote.
    pub async fn commit_one_phase(&mut self) -> Result<(), XaError> {
        self.check_rollback_only()?;
        self.drive(XaOp::CommitOnePhase).await
    }

    /// PREPARED | FAILED_COMMIT → COMMITTED.
    pub async fn commit(&mut self) -> Result<(), XaError> {
        self.check_rollback_only()?;
        self.drive(XaOp::Commit).await
    }

    /// PREPARED | FAILED_* (except FAILED_FORGET) → ROLLED_BACK.
    pub async fn rollback(&mut self) -> Result<(), XaError> {
        self.drive(XaOp::Rollback).await
    }

    /// COMMITTED | ROLLED_BACK | FAILED_FORGET → FORGOT.
    pub async fn forget(&mut self) -> Result<(), XaError> {
        self.drive(XaOp::Forget).await
    }

    /// Set the sticky rollback-only flag. ACTIVE only.
    pub fn mark_rollback_only(&mut self) -> Result<(), XaError> {
        if !self.state.permits(XaOp::MarkRollbackOnly) {
            return Err(self.illegal(XaOp::MarkRollbackOnly));
        }
        self.rollback_only = true;
        debug!(xid = %self.xid, "[sx-02] Branch marked rollback-only");
        Ok(())
    }

    /// Run a phase operation by tag.
    pub async fn apply(&mut self, op: XaOp) -> Result<(), XaError> {
        match op {
            XaOp::Start => self.start().await,
            XaOp::End => self.end().await,
            XaOp::Prepare => self.prepare().await,
            XaOp::CommitOnePhase => self.commit_one_phase().await,
            XaOp::Commit => self.commit().await,
            XaOp::Rollback => self.rollback().await,
            XaOp::Forget => self.forget().await,
            XaOp::MarkRollbackOnly => self.mark_rollback_only(),
            XaOp::Execute => Err(self.illegal(op)),
        }
    }

    /// Run one statement inside the branch. ACTIVE only.
    pub async fn execute(&mut self, command: &SqlCommand) -> Result<ExecOutcome, XaError> {
        if !self.state.permits(XaOp::Execute) {
            return Err(self.illegal(XaOp::Execute));
        }
        self.connection
            .execute(command)
            .await
            .map_err(|source| XaError::Failure {
                xid: self.xid.clone(),
                op: XaOp::Execute,
                source,
            })
    }

    /// Run a sub-batch inside the branch. ACTIVE only.
    pub async fn execute_batch(&mut self, batch: &SqlBatch) -> Result<Vec<u64>, XaError> {
        if !self.state.permits(XaOp::Execute) {
            return Err(self.illegal(XaOp::Execute));
        }
        self.connection
            .execute_batch(batch)
            .await
            .map_err(|source| XaError::Failure {
                xid: self.xid.clone(),
                op: XaOp::Execute,
                source,
            })
    }

    async fn drive(&mut self, op: XaOp) -> Result<(), XaError> {
        let transition = self.state.transition(op).ok_or_else(|| self.illegal(op))?;
        let from = self.state;
        self.state = transition.in_progress;
        if op == XaOp::CommitOnePhase {
            self.one_phase = true;
        }

        let result = if self.read_only {
            Ok(())
        } else {
            match op {
                XaOp::Start => self.connection.start(&self.xid, &self.options).await,
                XaOp::End => self.connection.end(&self.xid).await,
                XaOp::Prepare => self.connection.prepare(&self.xid).await,
                XaOp::CommitOnePhase => self.connection.commit(&self.xid, true).await,
                XaOp::Commit => self.connection.commit(&self.xid, self.one_phase).await,
                XaOp::Rollback => self.connection.rollback(&self.xid).await,
                XaOp::Forget => self.connection.forget(&self.xid).await,
                XaOp::MarkRollbackOnly | XaOp::Execute => Ok(()),
            }
        };

        match result {
            Ok(()) => {
                self.state = transition.success;
                debug!(
                    xid = %self.xid,
                    op = %op,
                    from = %from,
                    to = %self.state,
                    read_only = self.read_only,
                    "[sx-02] Branch transition"
                );
                Ok(())
            }
            Err(source) => {
                self.state = transition.failure;
                warn!(
                    xid = %self.xid,
                    op = %op,
                    state = %self.state,
                    error = %source,
                    "[sx-02] Branch operation failed"
                );
                Err(XaError::Failure {
                    xid: self.xid.clone(),
                    op,
                    source,
                })
            }
        }
    }

    fn check_rollback_only(&self) -> Result<(), XaError> {
        if self.rollback_only {
            return Err(XaError::RollbackOnly(self.xid.to_string()));
        }
        Ok(())
    }

    fn illegal(&self, op: XaOp) -> XaError {
        XaError::IllegalState {
            xid: self.xid.clone(),
            op,
            state: self.state,
        }
    }
}

impl std::fmt::Debug for XaParticipant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XaParticipant")
            .field("xid", &self.xid)
            .field("state", &self.state)
            .field("rollback_only", &self.rollback_only)
            .field("read_only", &self.read_only)
            .finish()
    }
}
