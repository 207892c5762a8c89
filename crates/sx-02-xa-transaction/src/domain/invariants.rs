//! # Domain Invariants
//!
//! Checks the coordinator runs between phases.

use super::errors::XaError;
use super::value_objects::{GlobalStatus, XaOp, XaState, Xid};

/// Commit may only be issued once every branch has voted yes.
///
/// Branches already past prepare (a re-entrant commit) also pass. The first
/// branch parked elsewhere, typically FAILED_IDLE or FAILED_PREPARE, is
/// reported.
pub fn invariant_all_prepared<'a, I>(branches: I) -> Result<(), XaError>
where
    I: IntoIterator<Item = (&'a Xid, XaState)>,
{
    for (xid, state) in branches {
        let voted = matches!(
            state,
            XaState::Prepared
                | XaState::FailedCommit
                | XaState::Committed
                | XaState::FailedForget
                | XaState::Forgot
        );
        if !voted {
            return Err(XaError::IllegalState {
                xid: xid.clone(),
                op: XaOp::Commit,
                state,
            });
        }
    }
    Ok(())
}

/// After a one-phase commit every branch must have committed, or be waiting
/// on a commit retry.
///
/// A branch still in FAILED_IDLE is skipped by every commit phase, so a
/// retried one-phase commit would otherwise finish without touching it.
pub fn invariant_one_phase_reached<'a, I>(branches: I) -> Result<(), XaError>
where
    I: IntoIterator<Item = (&'a Xid, XaState)>,
{
    for (xid, state) in branches {
        let reached = matches!(
            state,
            XaState::Committed | XaState::FailedCommit | XaState::FailedForget | XaState::Forgot
        );
        if !reached {
            return Err(XaError::IllegalState {
                xid: xid.clone(),
                op: XaOp::Commit,
                state,
            });
        }
    }
    Ok(())
}

/// Once the commit decision is recorded the transaction can only move
/// forward; rollback is refused.
pub fn invariant_rollback_undecided(
    commit_decided: bool,
    status: GlobalStatus,
) -> Result<(), XaError> {
    if commit_decided {
        return Err(XaError::IllegalStatus {
            op: "rollback",
            status,
        });
    }
    Ok(())
}
