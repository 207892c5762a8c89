//! Transaction Coordinator Service
//!
//! Owns one global transaction and its participant set, and implements
//! `GlobalTransactionApi`.
//!
//! Commit protocol:
//! - one participant: `end` then `commit(one-phase)`; prepare is never issued
//! - several participants: `end`, `prepare`, `commit`, `forget`, each phase
//!   completing across the whole set before the next one starts
//!
//! A failing phase stops the protocol, leaves status FAILED_COMMIT and
//! returns the first failure. A later `commit()` re-drives only the branches
//! still short of the phase they failed.

use async_trait::async_trait;
use shared_types::{ExecOutcome, ShardIndex, SqlBatch, SqlCommand};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::algorithms::{run_phase, XaParticipant};
use crate::domain::{
    invariant_all_prepared, invariant_one_phase_reached, invariant_rollback_undecided,
    CommitProtocol, CoordinatorConfig, GlobalStatus, Gtrid, ParticipantInfo, TransactionInfo,
    TransactionOptions, XaError, XaOp, Xid,
};
use crate::ports::inbound::GlobalTransactionApi;
use crate::ports::outbound::XaConnection;

/// Coordinator of one global transaction.
pub struct TransactionCoordinator {
    gtrid: Gtrid,
    status: GlobalStatus,
    options: TransactionOptions,
    config: CoordinatorConfig,
    participants: BTreeMap<ShardIndex, XaParticipant>,
    protocol: Option<CommitProtocol>,
    /// Set once every branch voted yes and the commit phase started.
    commit_decided: bool,
}

impl TransactionCoordinator {
    /// Coordinator with a freshly generated gtrid.
    pub fn new(options: TransactionOptions, config: CoordinatorConfig) -> Self {
        Self::with_gtrid(Gtrid::generate(), options, config)
    }

    /// Coordinator for a caller-supplied gtrid.
    pub fn with_gtrid(gtrid: Gtrid, options: TransactionOptions, config: CoordinatorConfig) -> Self {
        Self {
            gtrid,
            status: GlobalStatus::NotActive,
            options,
            config,
            participants: BTreeMap::new(),
            protocol: None,
            commit_decided: false,
        }
    }

    /// Global transaction id.
    pub fn gtrid(&self) -> &Gtrid {
        &self.gtrid
    }

    /// Options every branch is started with.
    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Protocol chosen by the first commit attempt.
    pub fn protocol(&self) -> Option<CommitProtocol> {
        self.protocol
    }

    /// Check if every branch voted yes and the commit phase started.
    pub fn is_commit_decided(&self) -> bool {
        self.commit_decided
    }

    /// Participant on `shard`, if enlisted.
    pub fn participant(&self, shard: ShardIndex) -> Option<&XaParticipant> {
        self.participants.get(&shard)
    }

    /// Check if `shard` has a participant.
    pub fn is_enlisted(&self, shard: ShardIndex) -> bool {
        self.participants.contains_key(&shard)
    }

    /// Number of participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Enlisted shards, ascending.
    pub fn shards(&self) -> Vec<ShardIndex> {
        self.participants.keys().copied().collect()
    }

    /// Snapshot of the transaction.
    pub fn info(&self) -> TransactionInfo {
        TransactionInfo {
            gtrid: self.gtrid.to_string(),
            status: self.status,
            participants: self.participant_statuses(),
        }
    }

    /// Run a statement on the branch of `shard`.
    pub async fn execute(
        &mut self,
        shard: ShardIndex,
        command: &SqlCommand,
    ) -> Result<ExecOutcome, XaError> {
        self.participant_mut(shard)?.execute(command).await
    }

    /// Run a sub-batch on the branch of `shard`.
    pub async fn execute_batch(
        &mut self,
        shard: ShardIndex,
        batch: &SqlBatch,
    ) -> Result<Vec<u64>, XaError> {
        self.participant_mut(shard)?.execute_batch(batch).await
    }

    fn participant_mut(&mut self, shard: ShardIndex) -> Result<&mut XaParticipant, XaError> {
        self.participants
            .get_mut(&shard)
            .ok_or(XaError::NotEnlisted(shard))
    }

    fn illegal(&self, op: &'static str) -> XaError {
        XaError::IllegalStatus {
            op,
            status: self.status,
        }
    }

    async fn phase(&mut self, op: XaOp) -> Result<(), XaError> {
        run_phase(&mut self.participants, op, self.config.phase_execution)
            .await
            .into_result()
    }

    async fn commit_one_phase(&mut self) -> Result<(), XaError> {
        self.phase(XaOp::End).await?;
        self.phase(XaOp::CommitOnePhase).await?;

        invariant_one_phase_reached(self.participants.values().map(|p| (p.xid(), p.state())))?;

        // retry of a failed one-phase commit
        self.phase(XaOp::Commit).await?;
        if self.config.forget_after_one_phase {
            self.phase(XaOp::Forget).await?;
        }
        Ok(())
    }

    async fn commit_two_phase(&mut self) -> Result<(), XaError> {
        self.phase(XaOp::End).await?;
        self.phase(XaOp::Prepare).await?;

        invariant_all_prepared(self.participants.values().map(|p| (p.xid(), p.state())))?;

        if !self.commit_decided {
            self.commit_decided = true;
            debug!(gtrid = %self.gtrid, "[sx-02] Commit decision recorded");
        }
        self.phase(XaOp::Commit).await?;
        self.phase(XaOp::Forget).await
    }

    async fn rollback_all(&mut self) -> Result<(), XaError> {
        let mut first: Option<XaError> = None;
        for op in [XaOp::End, XaOp::Prepare, XaOp::Rollback, XaOp::Forget] {
            if let Err(err) = self.phase(op).await {
                first.get_or_insert(err);
            }
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GlobalTransactionApi for TransactionCoordinator {
    fn begin(&mut self) -> Result<(), XaError> {
        if self.status != GlobalStatus::NotActive {
            return Err(self.illegal("begin"));
        }
        self.status = GlobalStatus::Active;
        debug!(gtrid = %self.gtrid, "[sx-02] Transaction begun");
        Ok(())
    }

    async fn enlist(
        &mut self,
        shard: ShardIndex,
        connection: Box<dyn XaConnection>,
    ) -> Result<(), XaError> {
        if !matches!(
            self.status,
            GlobalStatus::Active | GlobalStatus::MarkedRollback
        ) {
            return Err(self.illegal("enlist"));
        }
        if self.participants.contains_key(&shard) {
            return Err(XaError::AlreadyEnlisted(shard));
        }

        let xid = Xid::new(self.gtrid.clone(), shard);
        let mut participant = XaParticipant::new(xid, self.options.clone(), connection);
        participant.start().await?;
        if self.status == GlobalStatus::MarkedRollback {
            participant.mark_rollback_only()?;
        }

        debug!(
            gtrid = %self.gtrid,
            shard,
            participants = self.participants.len() + 1,
            "[sx-02] Participant enlisted"
        );
        self.participants.insert(shard, participant);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), XaError> {
        match self.status {
            GlobalStatus::MarkedRollback => {
                return Err(XaError::RollbackOnly(self.gtrid.to_string()));
            }
            GlobalStatus::Active | GlobalStatus::FailedCommit => {}
            _ => return Err(self.illegal("commit")),
        }
        if self.participants.values().any(|p| p.is_rollback_only()) {
            return Err(XaError::RollbackOnly(self.gtrid.to_string()));
        }

        let protocol = *self.protocol.get_or_insert(if self.participants.len() > 1 {
            CommitProtocol::TwoPhase
        } else {
            CommitProtocol::OnePhase
        });
        self.status = GlobalStatus::Committing;

        let result = match protocol {
            CommitProtocol::OnePhase => self.commit_one_phase().await,
            CommitProtocol::TwoPhase => self.commit_two_phase().await,
        };

        match result {
            Ok(()) => {
                self.status = GlobalStatus::Committed;
                info!(
                    gtrid = %self.gtrid,
                    protocol = %protocol,
                    participants = self.participants.len(),
                    "[sx-02] Transaction committed"
                );
                Ok(())
            }
            Err(err) => {
                self.status = GlobalStatus::FailedCommit;
                warn!(
                    gtrid = %self.gtrid,
                    protocol = %protocol,
                    error = %err,
                    "[sx-02] Commit failed"
                );
                Err(err)
            }
        }
    }

    async fn rollback(&mut self) -> Result<(), XaError> {
        match self.status {
            GlobalStatus::Active
            | GlobalStatus::MarkedRollback
            | GlobalStatus::FailedCommit
            | GlobalStatus::FailedRollback => {}
            _ => return Err(self.illegal("rollback")),
        }
        invariant_rollback_undecided(self.commit_decided, self.status)?;
        self.status = GlobalStatus::RollingBack;

        match self.rollback_all().await {
            Ok(()) => {
                self.status = GlobalStatus::RolledBack;
                info!(
                    gtrid = %self.gtrid,
                    participants = self.participants.len(),
                    "[sx-02] Transaction rolled back"
                );
                Ok(())
            }
            Err(err) => {
                self.status = GlobalStatus::FailedRollback;
                warn!(gtrid = %self.gtrid, error = %err, "[sx-02] Rollback failed");
                Err(err)
            }
        }
    }

    fn mark_rollback_only(&mut self) -> Result<(), XaError> {
        match self.status {
            GlobalStatus::MarkedRollback => return Ok(()),
            GlobalStatus::Active => {}
            _ => return Err(self.illegal("mark_rollback_only")),
        }
        for participant in self.participants.values_mut() {
            participant.mark_rollback_only()?;
        }
        self.status = GlobalStatus::MarkedRollback;
        debug!(gtrid = %self.gtrid, "[sx-02] Transaction marked rollback-only");
        Ok(())
    }

    fn status(&self) -> GlobalStatus {
        self.status
    }

    fn participant_statuses(&self) -> Vec<ParticipantInfo> {
        self.participants.values().map(XaParticipant::info).collect()
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("gtrid", &self.gtrid)
            .field("status", &self.status)
            .field("participants", &self.participants)
            .finish()
    }
}
