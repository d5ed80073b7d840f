//! Performance benchmarks for read-state operations.
//!
//! Run with: `cargo bench --bench read_state`
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | `is_read` cold | Store lookup on every call |
//! | `is_read` cached | LRU hit after the first lookup |
//! | `mark_read` repeat | Idempotent write, skipped when cached |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};
use std::sync::Arc;

use read_receipts::{CacheConfig, InMemoryKvStore, PostId, ReadStateService, UserId};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

/// Build a service with `markers` posts already marked by `bench_user`.
fn seeded_service(rt: &tokio::runtime::Runtime, cache: CacheConfig, markers: usize) -> ReadStateService<InMemoryKvStore> {
    let svc = ReadStateService::with_cache(Arc::new(InMemoryKvStore::new()), cache);
    let user = UserId::from("bench_user");
    rt.block_on(async {
        for i in 0..markers {
            svc.mark_read(&PostId::new(format!("post_{i}")), &user).await.unwrap();
        }
    });
    svc
}

fn bench_is_read(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("is_read");
    group.throughput(Throughput::Elements(1));

    for (label, cache) in [("cold", CacheConfig::disabled()), ("cached", CacheConfig::default())] {
        let svc = seeded_service(&rt, cache, 1_000);
        let post = PostId::from("post_500");
        let user = UserId::from("bench_user");

        group.bench_with_input(BenchmarkId::new(label, 1_000), &svc, |b, svc| {
            b.iter(|| rt.block_on(svc.is_read(black_box(&post), black_box(&user))).unwrap())
        });
    }

    group.finish();
}

fn bench_mark_read(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("mark_read_repeat");
    group.throughput(Throughput::Elements(1));

    for (label, cache) in [("uncached", CacheConfig::disabled()), ("cached", CacheConfig::default())] {
        let svc = seeded_service(&rt, cache, 1);
        let post = PostId::from("post_0");
        let user = UserId::from("bench_user");

        group.bench_with_input(BenchmarkId::new(label, 1), &svc, |b, svc| {
            b.iter(|| rt.block_on(svc.mark_read(black_box(&post), black_box(&user))).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_is_read, bench_mark_read);
criterion_main!(benches);
