//! # Shared Fixtures
//!
//! Three shards, each owning a contiguous id range:
//!
//! | Shard | `accounts.id` / `orders.account_id` |
//! |-------|-------------------------------------|
//! | 0     | 0 ..= 999                           |
//! | 1     | 1000 ..= 1999                       |
//! | 2     | 2000 ..= 2999                       |
//!
//! `accounts.region` routes at table level: `eu` → table 0, `us` → table 1.

use std::sync::Arc;

use shared_types::{param_row, ShardIndex, SqlCommand, Value};
use sx_01_routing::{
    BatchStatement, InMemoryShardRouter, Predicate, RouteLevel, RouteResolver,
    SingleTableStatement, Statement, StatementKind, TableMeta, TableRef,
};
use sx_02_xa_transaction::{
    CoordinatorConfig, GlobalTransactionApi, InMemoryResourceManager, TransactionCoordinator,
    TransactionOptions,
};
use sx_03_session::{CoordinatorSession, InMemoryDataSource, PlainRenderer, SessionConfig};
use sx_telemetry::TelemetryConfig;

/// Number of data-source shards.
pub const SHARD_COUNT: u32 = 3;

/// Ids owned by each shard.
pub const IDS_PER_SHARD: i64 = 1000;

/// `accounts(id, region, balance)`.
pub fn accounts() -> TableRef {
    TableRef::new(Arc::new(
        TableMeta::new("accounts")
            .with_route_fields(["id"])
            .with_table_route_fields(["region"]),
    ))
}

/// `orders(id, account_id, amount)`, sharded by owning account.
pub fn orders() -> TableRef {
    TableRef::new(Arc::new(
        TableMeta::new("orders").with_route_fields(["account_id"]),
    ))
}

/// Lookup router for the layout above.
pub fn router() -> InMemoryShardRouter {
    let router = InMemoryShardRouter::with_tables(SHARD_COUNT, 2);
    for shard in 0..SHARD_COUNT as i64 {
        let ids = shard * IDS_PER_SHARD..=(shard + 1) * IDS_PER_SHARD - 1;
        router
            .assign_range(RouteLevel::DataSource, "accounts", ids.clone(), shard as ShardIndex)
            .assign_range(RouteLevel::DataSource, "orders", ids, shard as ShardIndex);
    }
    router
        .assign(RouteLevel::Table, "accounts", "eu", 0)
        .assign(RouteLevel::Table, "accounts", "us", 1);
    router
}

/// Install logging and the metrics registry for this test binary.
///
/// Quiet (`warn`) unless `SX_LOG_LEVEL` or `RUST_LOG` asks for more.
pub fn init_telemetry() {
    let mut config = TelemetryConfig::for_subsystem("00", "tests");
    if std::env::var("SX_LOG_LEVEL").is_err() && std::env::var("RUST_LOG").is_err() {
        config.log_level = "warn".to_string();
    }
    // every test after the first finds the subscriber installed
    let _ = sx_telemetry::init_telemetry(&config);
}

/// Resolver over [`router`].
pub fn resolver() -> Arc<RouteResolver> {
    Arc::new(RouteResolver::new(Arc::new(router())))
}

/// Shard owning `id`.
pub fn shard_of(id: i64) -> ShardIndex {
    (id / IDS_PER_SHARD) as ShardIndex
}

/// Session over `rm` with order batches binding `amount` first.
pub fn session(rm: &InMemoryResourceManager, config: SessionConfig) -> CoordinatorSession {
    session_over(
        Arc::new(InMemoryDataSource::new(rm.clone(), SHARD_COUNT)),
        config,
    )
}

/// Session over a data source the caller keeps a handle to.
pub fn session_over(source: Arc<InMemoryDataSource>, config: SessionConfig) -> CoordinatorSession {
    init_telemetry();
    CoordinatorSession::new(
        resolver(),
        source,
        Arc::new(PlainRenderer::new().with_batch_fields(["amount", "account_id"])),
        config,
    )
}

/// `UPDATE accounts ... WHERE id = ?`.
pub fn update_account(id: i64) -> Statement {
    Statement::Single(SingleTableStatement {
        kind: StatementKind::Update,
        table: accounts(),
        predicates: vec![Predicate::eq("id", id)],
    })
}

/// `SELECT ... FROM accounts WHERE id = ?`.
pub fn select_account(id: i64) -> Statement {
    Statement::Single(SingleTableStatement {
        kind: StatementKind::Select,
        table: accounts(),
        predicates: vec![Predicate::eq("id", id)],
    })
}

/// Batch `INSERT INTO orders` with one `(account_id, amount)` row each.
pub fn insert_orders(rows: &[(Value, i64)]) -> Statement {
    Statement::Batch(BatchStatement {
        kind: StatementKind::Insert,
        table: orders(),
        rows: rows
            .iter()
            .map(|(account_id, amount)| {
                param_row([
                    ("account_id", account_id.clone()),
                    ("amount", Value::Int(*amount)),
                ])
            })
            .collect(),
    })
}

/// A pre-rendered write for direct coordinator tests.
pub fn write_on(shard: ShardIndex) -> SqlCommand {
    SqlCommand::new(
        format!("UPDATE accounts SET balance = balance + 1 /* shard {} */", shard),
        vec![Value::Int(shard as i64)],
    )
}

/// Active coordinator with one branch per shard, each holding one write.
pub async fn coordinator_with(
    rm: &InMemoryResourceManager,
    shards: &[ShardIndex],
    config: CoordinatorConfig,
) -> TransactionCoordinator {
    init_telemetry();
    let mut tx = TransactionCoordinator::new(TransactionOptions::default(), config);
    tx.begin().expect("fresh coordinator begins");
    for &shard in shards {
        tx.enlist(shard, Box::new(rm.connection(shard)))
            .await
            .expect("in-memory branch starts");
        tx.execute(shard, &write_on(shard))
            .await
            .expect("in-memory write succeeds");
    }
    tx
}
