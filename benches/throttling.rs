use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use throttled_log::{
    ChainedError, Context, Encoder, Field, Level, LogEntry, Metrics, ShardedStorage,
    ThrottleBucket, ThrottleKey, ThrottleRegistry,
};

type Registry = ThrottleRegistry<Arc<ShardedStorage<ThrottleKey, ThrottleBucket>>>;

fn registry() -> Registry {
    ThrottleRegistry::new(Arc::new(ShardedStorage::new()), Metrics::new())
}

/// Benchmark key construction speed
fn bench_key_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_construction");

    group.bench_function("short_message", |b| {
        b.iter(|| ThrottleKey::new(black_box(Level::Info), black_box("User logged in")))
    });

    let long = "x".repeat(500);
    group.bench_function("long_message", |b| {
        b.iter(|| ThrottleKey::new(black_box(Level::Info), black_box(long.as_str())))
    });

    group.finish();
}

/// Benchmark single-threaded observe throughput
fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe");
    group.throughput(Throughput::Elements(1000));

    let ctx = Context::background();
    let fields = vec![Field::new("user", "alice"), Field::new("attempt", 3_i64)];

    // Single key (worst case - every call hits the same shard)
    group.bench_function("single_key", |b| {
        let registry = registry();
        b.iter(|| {
            for _ in 0..1000 {
                let key = ThrottleKey::new(Level::Warn, "disk full");
                black_box(registry.observe(key, &ctx, &fields));
            }
        })
    });

    // 1000 unique keys, each created once then suppressed
    group.bench_function("1000_keys", |b| {
        let registry = registry();
        let messages: Vec<String> = (0..1000).map(|i| format!("Message {}", i)).collect();
        b.iter(|| {
            for message in &messages {
                let key = ThrottleKey::new(Level::Info, message);
                black_box(registry.observe(key, &ctx, &fields));
            }
        })
    });

    group.finish();
}

/// Benchmark multi-threaded observe throughput on one hot key
fn bench_concurrent_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let registry = registry();
                    std::thread::scope(|scope| {
                        for _ in 0..num_threads {
                            let registry = registry.clone();
                            scope.spawn(move || {
                                let ctx = Context::background();
                                for _ in 0..1000 {
                                    let key = ThrottleKey::new(Level::Warn, "disk full");
                                    black_box(registry.observe(key, &ctx, &[]));
                                }
                            });
                        }
                    });
                })
            },
        );
    }

    group.finish();
}

/// Benchmark draining registries of different sizes
fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    for num_keys in [100, 1000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("keys", num_keys),
            num_keys,
            |b, &num_keys| {
                let ctx = Context::background();
                b.iter(|| {
                    let registry = registry();
                    for i in 0..num_keys {
                        let message = format!("Message {}", i);
                        registry.observe(ThrottleKey::new(Level::Info, &message), &ctx, &[]);
                        registry.observe(ThrottleKey::new(Level::Info, &message), &ctx, &[]);
                    }
                    black_box(registry.drain())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark line encoding
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let encoder = Encoder::production(["correlation_id", "app_name"])
        .with_fields(vec![Field::new("app_name", "bench")]);
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let simple = LogEntry::new(at, Level::Info, "hello world").with_fields(vec![
        Field::new("world", "earth"),
        Field::new("correlation_id", "c-1"),
    ]);
    group.bench_function("simple", |b| {
        b.iter(|| black_box(encoder.encode_entry(black_box(&simple))))
    });

    let err = ChainedError::new("this is bad")
        .with_fields(vec![Field::new("big", "boom")])
        .wrap("goodbye");
    let with_error = LogEntry::new(at, Level::Error, "goodbye world")
        .with_fields(vec![Field::error("error", err), Field::new("world", "earth")]);
    group.bench_function("error_chain", |b| {
        b.iter(|| black_box(encoder.encode_entry(black_box(&with_error))))
    });

    let long = LogEntry::new(at, Level::Warn, "y".repeat(4096));
    group.bench_function("truncated_message", |b| {
        b.iter(|| black_box(encoder.encode_entry(black_box(&long))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_key_construction,
    bench_observe,
    bench_concurrent_observe,
    bench_drain,
    bench_encode,
);
criterion_main!(benches);
