//! # Inbound Ports
//!
//! Application-facing session API.

use async_trait::async_trait;
use sx_01_routing::{RouteKey, Statement};
use sx_02_xa_transaction::{TransactionInfo, TransactionOptions};

use crate::domain::{SessionError, StatementResult};

/// Coordinator session API - inbound port.
#[async_trait]
pub trait SessionApi: Send {
    /// Start a global transaction.
    fn begin(&mut self, options: TransactionOptions) -> Result<(), SessionError>;

    /// Route, enlist and dispatch one statement.
    async fn execute(&mut self, statement: &Statement) -> Result<StatementResult, SessionError>;

    /// Data-source level route key of a non-batch statement.
    fn resolve_route(&self, statement: &Statement) -> Result<RouteKey, SessionError>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> Result<(), SessionError>;

    /// Roll the current transaction back.
    async fn rollback(&mut self) -> Result<(), SessionError>;

    /// Make the current transaction rollback-only.
    fn mark_rollback_only(&mut self) -> Result<(), SessionError>;

    /// Finish any open transaction and reject later calls.
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Snapshot of the current or last transaction.
    fn transaction_info(&self) -> Option<TransactionInfo>;
}
