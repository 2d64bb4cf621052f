//! Benchmarks for sitewatch alerting components.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sitewatch::health::{AlertPolicy, AlertStore, DebouncePolicy, HysteresisPolicy, TargetHealth};
use sitewatch::metrics::MetricsCollector;
use sitewatch::probe::ProbeOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn outcomes() -> (ProbeOutcome, ProbeOutcome) {
    (
        ProbeOutcome::from_status(200, Duration::from_millis(20)),
        ProbeOutcome::from_status(503, Duration::from_millis(20)),
    )
}

fn benchmark_policies(c: &mut Criterion) {
    let (up, down) = outcomes();
    let now = Instant::now();

    let mut group = c.benchmark_group("policy");
    group.throughput(Throughput::Elements(2));

    let hysteresis = HysteresisPolicy::new(3, 2);
    group.bench_function("hysteresis_evaluate", |b| {
        let mut state = TargetHealth::default();
        b.iter(|| {
            black_box(hysteresis.evaluate(&mut state, &down, now));
            black_box(hysteresis.evaluate(&mut state, &up, now));
        })
    });

    let debounce = DebouncePolicy::new(3, Duration::from_secs(600));
    group.bench_function("debounce_evaluate", |b| {
        let mut state = TargetHealth::default();
        b.iter(|| {
            black_box(debounce.evaluate(&mut state, &down, now));
            black_box(debounce.evaluate(&mut state, &up, now));
        })
    });

    group.finish();
}

fn benchmark_store(c: &mut Criterion) {
    let (_, down) = outcomes();
    let now = Instant::now();
    let policy = HysteresisPolicy::new(3, 2);

    let store = Arc::new(AlertStore::new());
    let urls: Vec<String> = (0..100)
        .map(|i| format!("https://site-{}.example", i))
        .collect();
    for url in &urls {
        store.get_or_create(url);
    }

    let mut group = c.benchmark_group("alert_store");

    group.bench_function("get_or_create_existing", |b| {
        b.iter(|| black_box(store.get_or_create(&urls[42])))
    });

    group.bench_function("evaluate", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % urls.len();
            black_box(store.evaluate(&urls[i], &policy, &down, now))
        })
    });

    group.finish();
}

fn benchmark_metrics(c: &mut Criterion) {
    let collector = MetricsCollector::new();

    let mut group = c.benchmark_group("metrics");
    group.throughput(Throughput::Elements(1));

    group.bench_function("record_probe", |b| {
        b.iter(|| {
            collector.record_probe(
                black_box("https://example.com"),
                black_box(true),
                black_box(Duration::from_millis(35)),
            );
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_policies, benchmark_store, benchmark_metrics);
criterion_main!(benches);
