//! # XA Coordination Flows
//!
//! Drives `TransactionCoordinator` over recording in-memory resource
//! managers and checks the calls each shard actually received.
//!
//! ## Flows Tested:
//!
//! 1. **Two-phase success**: three branches end FORGOT, phases act as barriers
//! 2. **Prepare failure**: siblings of the failing branch are still prepared
//! 3. **One-phase equivalence**: no prepare, same data as a full 2PC
//! 4. **Re-entrant commit**: only unfinished branches are driven again
//! 5. **End failure**: a retried commit never reports success for an
//!    un-ended branch, under either protocol

#[cfg(test)]
mod tests {
    use shared_types::ShardIndex;
    use sx_02_xa_transaction::{
        CoordinatorConfig, GlobalStatus, GlobalTransactionApi, Gtrid, InMemoryResourceManager,
        TransactionOptions, XaError, XaOp, XaParticipant, XaState, XaVerb, Xid,
    };

    use crate::integration::fixtures::{coordinator_with, write_on};

    // =============================================================================
    // TEST HELPERS
    // =============================================================================

    /// Position of the first logged call matching `verb`.
    fn first_index(rm: &InMemoryResourceManager, verb: XaVerb) -> usize {
        rm.calls()
            .iter()
            .position(|c| c.verb == verb)
            .unwrap_or(usize::MAX)
    }

    /// Position of the last logged call matching `verb`.
    fn last_index(rm: &InMemoryResourceManager, verb: XaVerb) -> usize {
        rm.calls()
            .iter()
            .rposition(|c| c.verb == verb)
            .unwrap_or(0)
    }

    fn states(info: &[sx_02_xa_transaction::ParticipantInfo]) -> Vec<(ShardIndex, XaState)> {
        info.iter().map(|p| (p.shard, p.state)).collect()
    }

    // =============================================================================
    // TWO-PHASE COMMIT
    // =============================================================================

    #[tokio::test]
    async fn test_two_phase_commit_three_participants() {
        let rm = InMemoryResourceManager::new();
        let mut tx = coordinator_with(&rm, &[0, 1, 2], CoordinatorConfig::default()).await;

        tx.commit().await.unwrap();

        assert_eq!(tx.status(), GlobalStatus::Committed);
        assert!(tx
            .participant_statuses()
            .iter()
            .all(|p| p.state == XaState::Forgot));
        for shard in 0..3 {
            assert_eq!(
                rm.verbs(shard),
                vec![
                    XaVerb::Start,
                    XaVerb::Execute,
                    XaVerb::End,
                    XaVerb::Prepare,
                    XaVerb::Commit,
                    XaVerb::Forget,
                ]
            );
            assert_eq!(rm.committed(shard), vec![write_on(shard)]);
        }
        assert!(!rm.has_in_doubt_branches());
    }

    #[tokio::test]
    async fn test_phases_complete_across_all_participants_in_order() {
        let rm = InMemoryResourceManager::new();
        let mut tx = coordinator_with(&rm, &[0, 1, 2], CoordinatorConfig::default()).await;
        tx.commit().await.unwrap();

        assert!(last_index(&rm, XaVerb::End) < first_index(&rm, XaVerb::Prepare));
        assert!(last_index(&rm, XaVerb::Prepare) < first_index(&rm, XaVerb::Commit));
        assert!(last_index(&rm, XaVerb::Commit) < first_index(&rm, XaVerb::Forget));
    }

    #[tokio::test]
    async fn test_branches_share_gtrid_and_differ_by_shard() {
        let rm = InMemoryResourceManager::new();
        let mut tx = coordinator_with(&rm, &[0, 2], CoordinatorConfig::default()).await;
        tx.commit().await.unwrap();

        let xids: Vec<Xid> = rm
            .calls()
            .into_iter()
            .filter(|c| c.verb == XaVerb::Start)
            .filter_map(|c| c.xid)
            .collect();
        assert_eq!(xids.len(), 2);
        assert_eq!(xids[0].gtrid(), xids[1].gtrid());
        assert_ne!(xids[0], xids[1]);
        assert_ne!(xids[0].encode(), xids[1].encode());
        assert_eq!(Xid::decode(&xids[1].encode()).unwrap(), xids[1]);
    }

    // =============================================================================
    // PARTIAL FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_prepare_failure_still_prepares_siblings() {
        let rm = InMemoryResourceManager::new();
        rm.fail(1, XaVerb::Prepare, 1);
        let mut tx = coordinator_with(&rm, &[0, 1, 2], CoordinatorConfig::default()).await;

        let err = tx.commit().await.unwrap_err();
        match &err {
            XaError::Failure { xid, op, .. } => {
                assert_eq!(xid.shard(), 1);
                assert_eq!(*op, XaOp::Prepare);
            }
            other => panic!("expected branch failure, got {:?}", other),
        }
        assert_eq!(tx.status(), GlobalStatus::FailedCommit);

        for shard in [0, 2] {
            assert!(rm.verbs(shard).contains(&XaVerb::End));
            assert!(rm.verbs(shard).contains(&XaVerb::Prepare));
        }
        assert_eq!(rm.count(XaVerb::Commit), 0);
        assert_eq!(
            states(&tx.participant_statuses()),
            vec![
                (0, XaState::Prepared),
                (1, XaState::FailedPrepare),
                (2, XaState::Prepared),
            ]
        );

        tx.rollback().await.unwrap();
        assert_eq!(tx.status(), GlobalStatus::RolledBack);
        assert!((0..3).all(|shard| rm.committed(shard).is_empty()));
        assert!(!rm.has_in_doubt_branches());
    }

    #[tokio::test]
    async fn test_failed_prepare_branch_is_never_prepared_again() {
        let rm = InMemoryResourceManager::new();
        rm.fail(1, XaVerb::Prepare, 1);
        let mut tx = coordinator_with(&rm, &[0, 1], CoordinatorConfig::default()).await;
        assert!(tx.commit().await.is_err());

        rm.clear_calls();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(
            err,
            XaError::IllegalState {
                state: XaState::FailedPrepare,
                ..
            }
        ));
        assert_eq!(rm.count(XaVerb::Prepare), 0);
        assert_eq!(rm.count(XaVerb::Commit), 0);
    }

    // =============================================================================
    // ONE-PHASE COMMIT
    // =============================================================================

    #[tokio::test]
    async fn test_one_phase_matches_two_phase_outcome() {
        let one_phase = InMemoryResourceManager::new();
        let mut tx = coordinator_with(&one_phase, &[1], CoordinatorConfig::default()).await;
        tx.commit().await.unwrap();

        assert_eq!(one_phase.count(XaVerb::Prepare), 0);
        assert_eq!(one_phase.count(XaVerb::CommitOnePhase), 1);
        assert_eq!(tx.protocol(), Some(sx_02_xa_transaction::CommitProtocol::OnePhase));

        // Same single branch, driven through the full protocol by hand.
        let two_phase = InMemoryResourceManager::new();
        let mut branch = XaParticipant::new(
            Xid::new(Gtrid::generate(), 1),
            TransactionOptions::default(),
            Box::new(two_phase.connection(1)),
        );
        branch.start().await.unwrap();
        branch.execute(&write_on(1)).await.unwrap();
        branch.end().await.unwrap();
        branch.prepare().await.unwrap();
        branch.commit().await.unwrap();
        branch.forget().await.unwrap();

        assert_eq!(one_phase.committed(1), two_phase.committed(1));
        assert_eq!(branch.state(), XaState::Forgot);
        assert_eq!(tx.participant(1).unwrap().state(), XaState::Forgot);
    }

    // =============================================================================
    // RE-ENTRANT COMMIT
    // =============================================================================

    #[tokio::test]
    async fn test_reentrant_commit_redrives_only_unfinished_branches() {
        let rm = InMemoryResourceManager::new();
        rm.fail(2, XaVerb::Commit, 1);
        let mut tx = coordinator_with(&rm, &[0, 1, 2], CoordinatorConfig::default()).await;

        assert!(tx.commit().await.is_err());
        assert_eq!(tx.status(), GlobalStatus::FailedCommit);
        assert!(tx.is_commit_decided());
        assert_eq!(
            states(&tx.participant_statuses()),
            vec![
                (0, XaState::Committed),
                (1, XaState::Committed),
                (2, XaState::FailedCommit),
            ]
        );

        rm.clear_calls();
        tx.commit().await.unwrap();

        assert_eq!(tx.status(), GlobalStatus::Committed);
        assert!(rm.verbs(0).iter().all(|v| *v == XaVerb::Forget));
        assert!(rm.verbs(1).iter().all(|v| *v == XaVerb::Forget));
        assert_eq!(rm.verbs(2), vec![XaVerb::Commit, XaVerb::Forget]);
        assert_eq!(rm.committed(2), vec![write_on(2)]);
    }

    #[tokio::test]
    async fn test_commit_retry_after_end_failure_never_commits() {
        for shards in [vec![0], vec![0, 1]] {
            let rm = InMemoryResourceManager::new();
            rm.fail(0, XaVerb::End, 1);
            let mut tx = coordinator_with(&rm, &shards, CoordinatorConfig::default()).await;

            let first = tx.commit().await.unwrap_err();
            assert_eq!(first.failed_op(), Some(XaOp::End));

            let retry = tx.commit().await.unwrap_err();
            assert!(
                matches!(
                    retry,
                    XaError::IllegalState {
                        state: XaState::FailedIdle,
                        ..
                    }
                ),
                "{} shard(s): {:?}",
                shards.len(),
                retry
            );
            assert_eq!(tx.status(), GlobalStatus::FailedCommit);
            assert_eq!(tx.participant(0).unwrap().state(), XaState::FailedIdle);
            assert_eq!(rm.count(XaVerb::Commit) + rm.count(XaVerb::CommitOnePhase), 0);
            assert!(shards.iter().all(|&s| rm.committed(s).is_empty()));

            tx.rollback().await.unwrap();
            assert_eq!(tx.status(), GlobalStatus::RolledBack);
            assert!(!rm.has_in_doubt_branches());
        }
    }

    #[tokio::test]
    async fn test_decided_transaction_refuses_rollback() {
        let rm = InMemoryResourceManager::new();
        rm.fail(0, XaVerb::Commit, 1);
        let mut tx = coordinator_with(&rm, &[0, 1], CoordinatorConfig::default()).await;
        assert!(tx.commit().await.is_err());

        let err = tx.rollback().await.unwrap_err();
        assert!(matches!(err, XaError::IllegalStatus { op: "rollback", .. }));
        assert_eq!(rm.count(XaVerb::Rollback), 0);
    }

    #[tokio::test]
    async fn test_forget_on_forgotten_branch_rejected() {
        let rm = InMemoryResourceManager::new();
        let mut branch = XaParticipant::new(
            Xid::new(Gtrid::generate(), 0),
            TransactionOptions::default(),
            Box::new(rm.connection(0)),
        );
        branch.start().await.unwrap();
        branch.end().await.unwrap();
        branch.commit_one_phase().await.unwrap();
        branch.forget().await.unwrap();
        rm.clear_calls();

        let err = branch.forget().await.unwrap_err();
        assert!(matches!(
            err,
            XaError::IllegalState {
                op: XaOp::Forget,
                state: XaState::Forgot,
                ..
            }
        ));
        assert!(rm.calls().is_empty());
    }

    // =============================================================================
    // ROLLBACK-ONLY
    // =============================================================================

    #[tokio::test]
    async fn test_rollback_only_commit_contacts_no_shard() {
        let rm = InMemoryResourceManager::new();
        let mut tx = coordinator_with(&rm, &[0, 1], CoordinatorConfig::default()).await;
        tx.mark_rollback_only().unwrap();
        rm.clear_calls();

        assert!(matches!(tx.commit().await, Err(XaError::RollbackOnly(_))));
        assert!(rm.calls().is_empty());

        tx.rollback().await.unwrap();
        assert_eq!(rm.count(XaVerb::Rollback), 2);
        assert!(tx
            .participant_statuses()
            .iter()
            .all(|p| p.rollback_only && p.state == XaState::Forgot));
    }
}
