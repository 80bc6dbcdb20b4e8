use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hyper::HeaderMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stubber_proxy::delay::DelayScheduler;
use stubber_proxy::recording::{HistoryLog, RequestSnapshot, ResponseMeta};
use stubber_proxy::stubs::{MockRegistry, MockStub};

fn registry_with(count: usize) -> Arc<MockRegistry> {
    let registry = Arc::new(MockRegistry::new(Arc::new(DelayScheduler::new())));
    for i in 0..count {
        registry.set(
            MockStub::new(format!("/api/v1/endpoint{i}"), json!({"id": i})),
            Duration::ZERO,
        );
    }
    registry
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("stub_lookup");

    for stub_count in [10, 100, 1000].iter() {
        let registry = registry_with(*stub_count);
        let hit = format!("/api/v1/endpoint{}", stub_count / 2);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("exact_hit", stub_count), stub_count, |b, _| {
            b.iter(|| registry.lookup(black_box(&hit), black_box(&hit)));
        });

        // Query string misses the exact key and falls back to the base path
        let with_query = format!("{hit}?page=2");
        group.bench_with_input(
            BenchmarkId::new("base_path_fallback", stub_count),
            stub_count,
            |b, _| {
                b.iter(|| registry.lookup(black_box(&with_query), black_box(&hit)));
            },
        );

        group.bench_with_input(BenchmarkId::new("miss", stub_count), stub_count, |b, _| {
            b.iter(|| registry.lookup(black_box("/not/registered"), black_box("/not/registered")));
        });
    }

    group.finish();
}

fn bench_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("stub_claim");
    let registry = registry_with(100);

    group.throughput(Throughput::Elements(1));
    // Unlimited stub: claim and complete without removing anything
    group.bench_function("claim_complete_unlimited", |b| {
        b.iter(|| {
            if let Some(claim) = registry.claim(black_box("/api/v1/endpoint50"), "/api/v1/endpoint50") {
                black_box(claim.complete());
            }
        });
    });

    group.bench_function("claim_release_unlimited", |b| {
        b.iter(|| drop(registry.claim(black_box("/api/v1/endpoint50"), "/api/v1/endpoint50")));
    });

    group.finish();
}

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");
    let headers = HeaderMap::new();

    for capacity in [50, 1000].iter() {
        let history = HistoryLog::new(*capacity);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("append_patch", capacity),
            capacity,
            |b, _| {
                b.iter(|| {
                    let handle = history.append(RequestSnapshot::new("GET", "/api/items", &headers));
                    history.patch_response(handle, ResponseMeta::new(200, &headers))
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("list_all", capacity), capacity, |b, _| {
            b.iter(|| history.list(black_box(None)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_claim, bench_history);
criterion_main!(benches);
