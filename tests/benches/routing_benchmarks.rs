//! # Shard-XA Routing Benchmarks
//!
//! | Subsystem | Path | Target |
//! |-----------|------|--------|
//! | sx-01 Routing | Single-statement route resolution | < 1μs |
//! | sx-01 Routing | Batch partitioning, 10k rows | < 5ms |
//! | sx-03 Session | Batch fan-out + two-phase commit, 3 shards | < 10ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::time::Duration;

use shared_types::Value;
use sx_01_routing::{RouteLevel, RouteResolverApi};
use sx_02_xa_transaction::InMemoryResourceManager;
use sx_03_session::{SessionApi, SessionConfig};
use sx_tests::integration::fixtures::{insert_orders, resolver, session, update_account};

fn random_rows(count: usize) -> Vec<(Value, i64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (Value::Int(rng.gen_range(0..3000)), rng.gen_range(0..100)))
        .collect()
}

// ============================================================================
// SX-01: Route resolution
// ============================================================================

fn bench_resolve_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("sx-01-resolve");
    let resolver = resolver();
    let statement = update_account(1234);

    group.bench_function("single_table", |b| {
        b.iter(|| {
            resolver
                .resolve_shard(black_box(&statement), RouteLevel::DataSource)
                .unwrap()
        })
    });
    group.finish();
}

fn bench_partition_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("sx-01-partition");
    group.measurement_time(Duration::from_secs(10));
    let resolver = resolver();

    for size in [100usize, 1_000, 10_000] {
        let statement = insert_orders(&random_rows(size));
        let batch = match &statement {
            sx_01_routing::Statement::Batch(batch) => batch,
            _ => unreachable!("insert_orders builds a batch"),
        };
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("rows", size), batch, |b, batch| {
            b.iter(|| {
                resolver
                    .partition_batch(black_box(batch), RouteLevel::DataSource)
                    .unwrap()
            })
        });
    }
    group.finish();
}

// ============================================================================
// SX-03: Session batch fan-out with commit
// ============================================================================

fn bench_session_batch_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("sx-03-session");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for size in [10usize, 1_000] {
        let statement = insert_orders(&random_rows(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("batch_commit", size), &statement, |b, stmt| {
            b.iter(|| {
                runtime.block_on(async {
                    let rm = InMemoryResourceManager::new();
                    let mut s = session(&rm, SessionConfig::for_testing());
                    s.begin_default().unwrap();
                    s.execute(stmt).await.unwrap();
                    s.commit().await.unwrap();
                })
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_single,
    bench_partition_batch,
    bench_session_batch_commit
);
criterion_main!(benches);
