//! # Concurrent Phase Execution
//!
//! Runs the coordinator with `PhaseExecution::Concurrent` over connections
//! that stall on selected verbs, and checks that a phase still completes on
//! every branch before the next one starts.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_types::{ExecOutcome, ResourceError, ShardIndex, SqlBatch, SqlCommand};
    use std::sync::Arc;
    use std::time::Duration;

    use sx_02_xa_transaction::{
        CoordinatorConfig, GlobalStatus, GlobalTransactionApi, InMemoryResourceManager,
        InMemoryXaConnection, PhaseExecution, TransactionCoordinator, TransactionOptions,
        XaConnection, XaError, XaOp, XaVerb, Xid,
    };

    use crate::integration::fixtures::write_on;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Edge {
        Enter,
        Exit,
    }

    type Timeline = Arc<Mutex<Vec<(ShardIndex, XaVerb, Edge)>>>;

    /// Wraps an in-memory connection, sleeping before `delayed` verbs and
    /// recording when each verb is entered and left.
    struct StallingConnection {
        inner: InMemoryXaConnection,
        delayed: Vec<XaVerb>,
        delay: Duration,
        timeline: Timeline,
    }

    impl StallingConnection {
        fn new(
            rm: &InMemoryResourceManager,
            shard: ShardIndex,
            delayed: Vec<XaVerb>,
            timeline: Timeline,
        ) -> Self {
            Self {
                inner: rm.connection(shard),
                delayed,
                delay: Duration::from_millis(30),
                timeline,
            }
        }

        async fn enter(&self, verb: XaVerb) {
            let shard = self.inner.shard();
            self.timeline.lock().push((shard, verb, Edge::Enter));
            if self.delayed.contains(&verb) {
                tokio::time::sleep(self.delay).await;
            }
        }

        fn exit(&self, verb: XaVerb) {
            self.timeline
                .lock()
                .push((self.inner.shard(), verb, Edge::Exit));
        }
    }

    #[async_trait]
    impl XaConnection for StallingConnection {
        async fn start(&mut self, xid: &Xid, options: &TransactionOptions) -> Result<(), ResourceError> {
            self.inner.start(xid, options).await
        }

        async fn end(&mut self, xid: &Xid) -> Result<(), ResourceError> {
            self.enter(XaVerb::End).await;
            let result = self.inner.end(xid).await;
            self.exit(XaVerb::End);
            result
        }

        async fn prepare(&mut self, xid: &Xid) -> Result<(), ResourceError> {
            self.enter(XaVerb::Prepare).await;
            let result = self.inner.prepare(xid).await;
            self.exit(XaVerb::Prepare);
            result
        }

        async fn commit(&mut self, xid: &Xid, one_phase: bool) -> Result<(), ResourceError> {
            self.enter(XaVerb::Commit).await;
            let result = self.inner.commit(xid, one_phase).await;
            self.exit(XaVerb::Commit);
            result
        }

        async fn rollback(&mut self, xid: &Xid) -> Result<(), ResourceError> {
            self.enter(XaVerb::Rollback).await;
            let result = self.inner.rollback(xid).await;
            self.exit(XaVerb::Rollback);
            result
        }

        async fn forget(&mut self, xid: &Xid) -> Result<(), ResourceError> {
            self.inner.forget(xid).await
        }

        async fn execute(&mut self, command: &SqlCommand) -> Result<ExecOutcome, ResourceError> {
            self.inner.execute(command).await
        }

        async fn execute_batch(&mut self, batch: &SqlBatch) -> Result<Vec<u64>, ResourceError> {
            self.inner.execute_batch(batch).await
        }
    }

    fn concurrent() -> CoordinatorConfig {
        CoordinatorConfig {
            phase_execution: PhaseExecution::Concurrent,
            ..CoordinatorConfig::default()
        }
    }

    async fn stalled_coordinator(
        rm: &InMemoryResourceManager,
        timeline: &Timeline,
        stalls: &[(ShardIndex, Vec<XaVerb>)],
    ) -> TransactionCoordinator {
        let mut tx = TransactionCoordinator::new(TransactionOptions::default(), concurrent());
        tx.begin().unwrap();
        for (shard, delayed) in stalls {
            let conn = StallingConnection::new(rm, *shard, delayed.clone(), timeline.clone());
            tx.enlist(*shard, Box::new(conn)).await.unwrap();
            tx.execute(*shard, &write_on(*shard)).await.unwrap();
        }
        tx
    }

    fn position(timeline: &Timeline, pred: impl Fn(&(ShardIndex, XaVerb, Edge)) -> bool) -> Vec<usize> {
        timeline
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, event)| pred(*event))
            .map(|(i, _)| i)
            .collect()
    }

    #[tokio::test]
    async fn test_slow_prepare_holds_back_every_commit() {
        let rm = InMemoryResourceManager::new();
        let timeline = Timeline::default();
        let mut tx = stalled_coordinator(
            &rm,
            &timeline,
            &[
                (0, vec![XaVerb::Prepare]),
                (1, vec![]),
                (2, vec![XaVerb::End]),
            ],
        )
        .await;

        tx.commit().await.unwrap();
        assert_eq!(tx.status(), GlobalStatus::Committed);

        let prepare_exits = position(&timeline, |e| e.1 == XaVerb::Prepare && e.2 == Edge::Exit);
        let commit_enters = position(&timeline, |e| e.1 == XaVerb::Commit && e.2 == Edge::Enter);
        let end_exits = position(&timeline, |e| e.1 == XaVerb::End && e.2 == Edge::Exit);
        let prepare_enters = position(&timeline, |e| e.1 == XaVerb::Prepare && e.2 == Edge::Enter);

        assert_eq!(prepare_exits.len(), 3);
        assert_eq!(commit_enters.len(), 3);
        assert!(end_exits.iter().max() < prepare_enters.iter().min());
        assert!(prepare_exits.iter().max() < commit_enters.iter().min());
    }

    #[tokio::test]
    async fn test_branches_in_one_phase_overlap() {
        let rm = InMemoryResourceManager::new();
        let timeline = Timeline::default();
        let mut tx = stalled_coordinator(
            &rm,
            &timeline,
            &[(0, vec![XaVerb::Prepare]), (1, vec![XaVerb::Prepare])],
        )
        .await;
        tx.commit().await.unwrap();

        // Both prepares are entered before either leaves.
        let prepares: Vec<Edge> = timeline
            .lock()
            .iter()
            .filter(|e| e.1 == XaVerb::Prepare)
            .map(|e| e.2)
            .collect();
        assert_eq!(prepares, vec![Edge::Enter, Edge::Enter, Edge::Exit, Edge::Exit]);
    }

    #[tokio::test]
    async fn test_concurrent_failure_reports_lowest_shard() {
        let rm = InMemoryResourceManager::new();
        rm.fail(2, XaVerb::Prepare, 1).fail(1, XaVerb::Prepare, 1);
        let timeline = Timeline::default();
        let mut tx = stalled_coordinator(
            &rm,
            &timeline,
            &[(0, vec![]), (1, vec![XaVerb::Prepare]), (2, vec![])],
        )
        .await;

        match tx.commit().await {
            Err(XaError::Failure { xid, op, .. }) => {
                assert_eq!(xid.shard(), 1);
                assert_eq!(op, XaOp::Prepare);
            }
            other => panic!("expected prepare failure, got {:?}", other),
        }
        assert_eq!(rm.count(XaVerb::Prepare), 3);

        tx.rollback().await.unwrap();
        assert_eq!(tx.status(), GlobalStatus::RolledBack);
        assert!(!rm.has_in_doubt_branches());
    }
}
