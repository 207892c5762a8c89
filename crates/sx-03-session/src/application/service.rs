//! Coordinator Session Service
//!
//! Per-transaction façade: routes each statement, lazily enlists the shards
//! it touches and dispatches it, then commits or rolls back through the
//! transaction coordinator.
//!
//! Batch statements are partitioned before anything is sent. Every sub-batch
//! is rendered and every shard enlisted before the first sub-batch is
//! dispatched, and per-row results come back in the caller's row order.

use async_trait::async_trait;
use shared_types::ShardIndex;
use std::collections::BTreeMap;
use std::sync::Arc;
use sx_01_routing::{
    BatchStatement, RouteError, RouteKey, RouteLevel, RouteResolverApi, Statement,
};
use sx_02_xa_transaction::{
    CommitProtocol, GlobalStatus, GlobalTransactionApi, TransactionCoordinator, TransactionInfo,
    TransactionOptions, XaError,
};
use tracing::{debug, info, warn};

use crate::algorithms::reassemble_batch_results;
use crate::domain::{SessionConfig, SessionError, StatementResult};
use crate::ports::inbound::SessionApi;
use crate::ports::outbound::{ShardDataSource, StatementRenderer};

/// Coordinator Session
///
/// Statement pipeline:
/// 1. Resolve the data-source route (or partition the batch)
/// 2. Render SQL per target shard
/// 3. Enlist shards not yet in the transaction
/// 4. Dispatch and collect results
pub struct CoordinatorSession {
    resolver: Arc<dyn RouteResolverApi>,
    data_source: Arc<dyn ShardDataSource>,
    renderer: Arc<dyn StatementRenderer>,
    config: SessionConfig,
    transaction: Option<TransactionCoordinator>,
    closed: bool,
}

impl CoordinatorSession {
    /// Create a session with no transaction.
    pub fn new(
        resolver: Arc<dyn RouteResolverApi>,
        data_source: Arc<dyn ShardDataSource>,
        renderer: Arc<dyn StatementRenderer>,
        config: SessionConfig,
    ) -> Self {
        if config.record_metrics {
            if let Err(e) = sx_telemetry::register_metrics() {
                warn!(error = %e, "[sx-03] Metrics registration failed");
            }
        }
        Self {
            resolver,
            data_source,
            renderer,
            config,
            transaction: None,
            closed: false,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check if the session was closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current or last transaction.
    pub fn coordinator(&self) -> Option<&TransactionCoordinator> {
        self.transaction.as_ref()
    }

    /// Begin a read-write transaction with the configured timeout.
    pub fn begin_default(&mut self) -> Result<(), SessionError> {
        let options = self.config.transaction_options();
        self.begin(options)
    }

    /// Table-level route key of a non-batch statement.
    pub fn resolve_table_route(&self, statement: &Statement) -> Result<RouteKey, SessionError> {
        self.ensure_open()?;
        self.routed(self.resolver.resolve(statement, RouteLevel::Table))
    }

    /// Data-source shard a non-batch statement routes to.
    pub fn route_shard(&self, statement: &Statement) -> Result<ShardIndex, SessionError> {
        self.ensure_open()?;
        self.routed(self.resolver.resolve_shard(statement, RouteLevel::DataSource))
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// The unfinished transaction.
    fn active(&mut self) -> Result<&mut TransactionCoordinator, SessionError> {
        self.ensure_open()?;
        match self.transaction.as_mut() {
            Some(tx) if !tx.status().is_completed() => Ok(tx),
            _ => Err(SessionError::NoTransaction),
        }
    }

    fn routed<T>(&self, result: Result<T, RouteError>) -> Result<T, SessionError> {
        result.map_err(|err| {
            if self.config.record_metrics {
                sx_telemetry::record_routing_failure(err.kind());
            }
            warn!(error = %err, "[sx-03] Routing failed");
            SessionError::Route(err)
        })
    }

    fn record_outcome(&self, protocol: CommitProtocol, outcome: &str, result: &Result<(), XaError>) {
        if !self.config.record_metrics {
            return;
        }
        let protocol = protocol.to_string();
        match result {
            Ok(()) => sx_telemetry::record_transaction(&protocol, outcome),
            Err(err) => {
                sx_telemetry::record_transaction(&protocol, "failed");
                if let Some(op) = err.failed_op() {
                    sx_telemetry::record_phase_failure(&op.to_string());
                }
            }
        }
    }

    async fn ensure_enlisted(&mut self, shard: ShardIndex) -> Result<(), SessionError> {
        if self.active()?.is_enlisted(shard) {
            return Ok(());
        }
        let connection = self
            .data_source
            .connect(shard)
            .await
            .map_err(|source| SessionError::Connection { shard, source })?;
        self.active()?.enlist(shard, connection).await?;
        if self.config.record_metrics {
            sx_telemetry::record_enlisted();
        }
        Ok(())
    }

    async fn execute_single(
        &mut self,
        statement: &Statement,
    ) -> Result<StatementResult, SessionError> {
        let shard = self.routed(
            self.resolver
                .resolve_shard(statement, RouteLevel::DataSource),
        )?;
        let command = self.renderer.render(statement, shard)?;
        self.ensure_enlisted(shard).await?;

        let outcome = self
            .active()?
            .execute(shard, &command)
            .await
            .map_err(|source| SessionError::Execution { shard, source })?;

        debug!(
            statement = %statement,
            shard,
            affected = outcome.affected_rows,
            "[sx-03] Statement executed"
        );
        Ok(StatementResult {
            shards: vec![shard],
            affected_rows: vec![outcome.affected_rows],
            rows: outcome.rows,
        })
    }

    async fn execute_batch(
        &mut self,
        batch: &BatchStatement,
    ) -> Result<StatementResult, SessionError> {
        let route = self.routed(self.resolver.partition_batch(batch, RouteLevel::DataSource))?;

        let mut sub_batches = Vec::with_capacity(route.groups.len());
        for (shard, rows) in &route.groups {
            sub_batches.push((*shard, self.renderer.render_batch(batch, *shard, rows)?));
        }
        for (shard, _) in &sub_batches {
            self.ensure_enlisted(*shard).await?;
        }

        let mut results = BTreeMap::new();
        for (shard, sub_batch) in &sub_batches {
            let counts = self
                .active()?
                .execute_batch(*shard, sub_batch)
                .await
                .map_err(|source| SessionError::Execution {
                    shard: *shard,
                    source,
                })?;
            results.insert(*shard, counts);
        }

        let affected_rows = reassemble_batch_results(&route, &results)?;
        if self.config.record_metrics {
            sx_telemetry::record_batch_rows(route.row_count);
        }
        debug!(
            table = batch.table.name(),
            rows = route.row_count,
            shards = route.groups.len(),
            "[sx-03] Batch dispatched"
        );
        Ok(StatementResult {
            shards: route.shards(),
            affected_rows,
            rows: Vec::new(),
        })
    }
}

fn protocol_for(tx: &TransactionCoordinator) -> CommitProtocol {
    tx.protocol().unwrap_or(if tx.participant_count() > 1 {
        CommitProtocol::TwoPhase
    } else {
        CommitProtocol::OnePhase
    })
}

#[async_trait]
impl SessionApi for CoordinatorSession {
    fn begin(&mut self, options: TransactionOptions) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Some(tx) = &self.transaction {
            if !tx.status().is_completed() {
                return Err(SessionError::TransactionInProgress);
            }
        }

        let mut tx = TransactionCoordinator::new(options, self.config.coordinator_config());
        tx.begin()?;
        info!(
            gtrid = %tx.gtrid(),
            read_only = tx.options().read_only,
            "[sx-03] Transaction begun"
        );
        self.transaction = Some(tx);
        Ok(())
    }

    async fn execute(&mut self, statement: &Statement) -> Result<StatementResult, SessionError> {
        let read_only = self.active()?.options().read_only;
        let kind = statement.kind();
        if read_only && !kind.is_read_only() {
            return Err(SessionError::ReadOnlyTransaction(format!("{:?}", kind)));
        }

        match statement {
            Statement::Batch(batch) => self.execute_batch(batch).await,
            _ => self.execute_single(statement).await,
        }
    }

    fn resolve_route(&self, statement: &Statement) -> Result<RouteKey, SessionError> {
        self.ensure_open()?;
        self.routed(self.resolver.resolve(statement, RouteLevel::DataSource))
    }

    async fn commit(&mut self) -> Result<(), SessionError> {
        let tx = self.active()?;
        let protocol = protocol_for(tx);
        let result = tx.commit().await;
        self.record_outcome(protocol, "committed", &result);
        result.map_err(SessionError::from)
    }

    async fn rollback(&mut self) -> Result<(), SessionError> {
        let tx = self.active()?;
        let protocol = protocol_for(tx);
        let result = tx.rollback().await;
        self.record_outcome(protocol, "rolled_back", &result);
        result.map_err(SessionError::from)
    }

    fn mark_rollback_only(&mut self) -> Result<(), SessionError> {
        self.active()?.mark_rollback_only()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let tx = match self.transaction.as_mut() {
            Some(tx) if !tx.status().is_completed() && tx.status() != GlobalStatus::NotActive => tx,
            _ => return Ok(()),
        };
        let result = if tx.is_commit_decided() {
            tx.commit().await
        } else {
            tx.rollback().await
        };
        info!(
            gtrid = %tx.gtrid(),
            status = %tx.status(),
            "[sx-03] Session closed with unfinished transaction"
        );
        result.map_err(SessionError::from)
    }

    fn transaction_info(&self) -> Option<TransactionInfo> {
        self.transaction.as_ref().map(TransactionCoordinator::info)
    }
}
