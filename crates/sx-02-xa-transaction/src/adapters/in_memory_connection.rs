//! In-Memory XA Resource Manager Adapter
//!
//! A recording stand-in for the shards' resource managers.
//!
//! - Every verb is appended to a shared call log before it is answered.
//! - Faults can be injected per (shard, verb) for a number of calls.
//! - Statements run inside a branch are held pending and only become
//!   visible in the shard's committed log on commit; rollback discards them.
//!   Statements run outside a branch apply immediately.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ExecOutcome, ResourceError, Row, ShardIndex, SqlBatch, SqlCommand, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{TransactionOptions, Xid};
use crate::ports::outbound::XaConnection;

/// XA error code for a protocol violation (`XAER_PROTO`).
pub const XAER_PROTO: i32 = -6;

/// XA error code for an unknown branch (`XAER_NOTA`).
pub const XAER_NOTA: i32 = -4;

/// Resource-manager failure code used for injected faults (`XAER_RMFAIL`).
pub const XAER_RMFAIL: i32 = -7;

/// Verb received by the resource manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XaVerb {
    /// `xa_start`
    Start,
    /// `xa_end`
    End,
    /// `xa_prepare`
    Prepare,
    /// `xa_commit` with the one-phase flag
    CommitOnePhase,
    /// `xa_commit`
    Commit,
    /// `xa_rollback`
    Rollback,
    /// `xa_forget`
    Forget,
    /// single statement
    Execute,
    /// batched statement
    ExecuteBatch,
}

/// One logged call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XaCall {
    /// Shard that received the call.
    pub shard: ShardIndex,
    /// Verb.
    pub verb: XaVerb,
    /// Branch the call was issued for, if any.
    pub xid: Option<Xid>,
}

#[derive(Default)]
struct RmState {
    calls: Vec<XaCall>,
    faults: HashMap<(ShardIndex, XaVerb), u32>,
    pending: HashMap<Xid, Vec<SqlCommand>>,
    prepared: HashSet<Xid>,
    committed: BTreeMap<ShardIndex, Vec<SqlCommand>>,
    query_rows: HashMap<ShardIndex, Vec<Row>>,
}

impl RmState {
    fn record(&mut self, shard: ShardIndex, verb: XaVerb, xid: Option<&Xid>) -> Result<(), ResourceError> {
        self.calls.push(XaCall {
            shard,
            verb,
            xid: xid.cloned(),
        });
        match self.faults.get_mut(&(shard, verb)) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(ResourceError::with_code(
                    XAER_RMFAIL,
                    format!("injected {:?} failure on shard {}", verb, shard),
                ))
            }
            _ => Ok(()),
        }
    }

    fn apply(&mut self, shard: ShardIndex, branch: Option<&Xid>, command: SqlCommand) {
        match branch {
            Some(xid) => self.pending.entry(xid.clone()).or_default().push(command),
            None => self.committed.entry(shard).or_default().push(command),
        }
    }
}

/// Shared in-memory resource managers for any number of shards.
///
/// Cloning shares the same log and data.
#[derive(Clone, Default)]
pub struct InMemoryResourceManager {
    state: Arc<Mutex<RmState>>,
}

impl InMemoryResourceManager {
    /// Create an empty resource manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection to `shard`.
    pub fn connection(&self, shard: ShardIndex) -> InMemoryXaConnection {
        InMemoryXaConnection {
            shard,
            branch: None,
            rm: self.clone(),
        }
    }

    /// Fail the next `times` calls of `verb` on `shard`.
    pub fn fail(&self, shard: ShardIndex, verb: XaVerb, times: u32) -> &Self {
        self.state.lock().faults.insert((shard, verb), times);
        self
    }

    /// Fail every call of `verb` on `shard` until cleared.
    pub fn fail_always(&self, shard: ShardIndex, verb: XaVerb) -> &Self {
        self.fail(shard, verb, u32::MAX)
    }

    /// Remove every injected fault.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Rows returned by queries on `shard`.
    pub fn set_query_rows(&self, shard: ShardIndex, rows: Vec<Row>) -> &Self {
        self.state.lock().query_rows.insert(shard, rows);
        self
    }

    /// Full call log, in arrival order.
    pub fn calls(&self) -> Vec<XaCall> {
        self.state.lock().calls.clone()
    }

    /// Verbs received by `shard`, in arrival order.
    pub fn verbs(&self, shard: ShardIndex) -> Vec<XaVerb> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.shard == shard)
            .map(|c| c.verb)
            .collect()
    }

    /// Number of calls of `verb` across all shards.
    pub fn count(&self, verb: XaVerb) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.verb == verb)
            .count()
    }

    /// Forget the call log, keeping data and faults.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Statements durably committed on `shard`.
    pub fn committed(&self, shard: ShardIndex) -> Vec<SqlCommand> {
        self.state
            .lock()
            .committed
            .get(&shard)
            .cloned()
            .unwrap_or_default()
    }

    /// Check if any branch is still prepared and undecided.
    pub fn has_in_doubt_branches(&self) -> bool {
        !self.state.lock().prepared.is_empty()
    }
}

/// Connection to one shard of an [`InMemoryResourceManager`].
pub struct InMemoryXaConnection {
    shard: ShardIndex,
    branch: Option<Xid>,
    rm: InMemoryResourceManager,
}

impl InMemoryXaConnection {
    /// Shard this connection talks to.
    pub fn shard(&self) -> ShardIndex {
        self.shard
    }
}

#[async_trait]
impl XaConnection for InMemoryXaConnection {
    async fn start(&mut self, xid: &Xid, _options: &TransactionOptions) -> Result<(), ResourceError> {
        self.rm.state.lock().record(self.shard, XaVerb::Start, Some(xid))?;
        if self.branch.is_some() {
            return Err(ResourceError::with_code(XAER_PROTO, "connection already in a branch"));
        }
        self.branch = Some(xid.clone());
        Ok(())
    }

    async fn end(&mut self, xid: &Xid) -> Result<(), ResourceError> {
        self.rm.state.lock().record(self.shard, XaVerb::End, Some(xid))?;
        if self.branch.as_ref() != Some(xid) {
            return Err(ResourceError::with_code(XAER_NOTA, "branch not associated"));
        }
        self.branch = None;
        Ok(())
    }

    async fn prepare(&mut self, xid: &Xid) -> Result<(), ResourceError> {
        let mut state = self.rm.state.lock();
        state.record(self.shard, XaVerb::Prepare, Some(xid))?;
        state.prepared.insert(xid.clone());
        Ok(())
    }

    async fn commit(&mut self, xid: &Xid, one_phase: bool) -> Result<(), ResourceError> {
        let verb = if one_phase {
            XaVerb::CommitOnePhase
        } else {
            XaVerb::Commit
        };
        let mut state = self.rm.state.lock();
        state.record(self.shard, verb, Some(xid))?;
        if !one_phase && !state.prepared.remove(xid) {
            return Err(ResourceError::with_code(XAER_PROTO, "two-phase commit of unprepared branch"));
        }
        let pending = state.pending.remove(xid).unwrap_or_default();
        state.committed.entry(self.shard).or_default().extend(pending);
        Ok(())
    }

    async fn rollback(&mut self, xid: &Xid) -> Result<(), ResourceError> {
        let mut state = self.rm.state.lock();
        state.record(self.shard, XaVerb::Rollback, Some(xid))?;
        state.prepared.remove(xid);
        state.pending.remove(xid);
        if self.branch.as_ref() == Some(xid) {
            self.branch = None;
        }
        Ok(())
    }

    async fn forget(&mut self, xid: &Xid) -> Result<(), ResourceError> {
        self.rm.state.lock().record(self.shard, XaVerb::Forget, Some(xid))
    }

    async fn execute(&mut self, command: &SqlCommand) -> Result<ExecOutcome, ResourceError> {
        let mut state = self.rm.state.lock();
        state.record(self.shard, XaVerb::Execute, self.branch.as_ref())?;

        if command.sql.trim_start().to_ascii_lowercase().starts_with("select") {
            let rows = state.query_rows.get(&self.shard).cloned().unwrap_or_default();
            return Ok(ExecOutcome {
                affected_rows: 0,
                rows,
            });
        }

        state.apply(self.shard, self.branch.as_ref(), command.clone());
        Ok(ExecOutcome {
            affected_rows: 1,
            rows: Vec::new(),
        })
    }

    /// Each row reports its first non-negative integer parameter as its
    /// affected-row count, or 1 when it has none.
    async fn execute_batch(&mut self, batch: &SqlBatch) -> Result<Vec<u64>, ResourceError> {
        let mut state = self.rm.state.lock();
        state.record(self.shard, XaVerb::ExecuteBatch, self.branch.as_ref())?;

        let mut counts = Vec::with_capacity(batch.rows.len());
        for params in &batch.rows {
            let count = params
                .iter()
                .find_map(|v| match v {
                    Value::Int(n) if *n >= 0 => Some(*n as u64),
                    _ => None,
                })
                .unwrap_or(1);
            counts.push(count);
            state.apply(
                self.shard,
                self.branch.as_ref(),
                SqlCommand::new(batch.sql.clone(), params.clone()),
            );
        }
        Ok(counts)
    }
}
