//! # Phase Driver
//!
//! Runs one XA phase across a participant set with barrier semantics.
//!
//! A participant is driven only if its own state permits the phase
//! operation, so a re-entrant commit or rollback re-drives exactly the
//! branches still pending that phase. A failing participant never stops its
//! siblings: every eligible branch is attempted before the phase reports.
//!
//! The reported error is the failure of the lowest shard index, whichever
//! finished first in wall-clock time.

use futures::future::join_all;
use shared_types::ShardIndex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::algorithms::participant::XaParticipant;
use crate::domain::{PhaseExecution, XaError, XaOp};

/// Result of one phase across the participant set.
#[derive(Debug)]
pub struct PhaseOutcome {
    /// Phase operation.
    pub op: XaOp,
    /// Shards that were eligible and attempted, ascending.
    pub attempted: Vec<ShardIndex>,
    /// Failures in ascending shard order.
    pub failures: Vec<(ShardIndex, XaError)>,
}

impl PhaseOutcome {
    /// Check if every attempted participant succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure by shard order.
    pub fn into_result(self) -> Result<(), XaError> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

/// Drive `op` on every participant whose state permits it.
pub async fn run_phase(
    participants: &mut BTreeMap<ShardIndex, XaParticipant>,
    op: XaOp,
    execution: PhaseExecution,
) -> PhaseOutcome {
    let eligible: Vec<&mut XaParticipant> = participants
        .values_mut()
        .filter(|p| p.state().permits(op))
        .collect();
    let attempted: Vec<ShardIndex> = eligible.iter().map(|p| p.shard()).collect();

    let results: Vec<Result<(), XaError>> = match execution {
        PhaseExecution::Sequential => {
            let mut results = Vec::with_capacity(eligible.len());
            for participant in eligible {
                results.push(participant.apply(op).await);
            }
            results
        }
        PhaseExecution::Concurrent => join_all(eligible.into_iter().map(|p| p.apply(op))).await,
    };

    let failures: Vec<(ShardIndex, XaError)> = attempted
        .iter()
        .zip(results)
        .filter_map(|(shard, result)| result.err().map(|err| (*shard, err)))
        .collect();

    if failures.is_empty() {
        debug!(op = %op, participants = attempted.len(), "[sx-02] Phase complete");
    } else {
        warn!(
            op = %op,
            participants = attempted.len(),
            failed = failures.len(),
            first_shard = failures[0].0,
            "[sx-02] Phase failed"
        );
    }

    PhaseOutcome {
        op,
        attempted,
        failures,
    }
}
