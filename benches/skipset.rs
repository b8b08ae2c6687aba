//! Throughput benchmarks for the mixed read-heavy workload the crate
//! targets: 90% contains, 9% add, 1% remove.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skipset::{Ascending, SkipSet};
use std::sync::Arc;
use std::thread;

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let set: SkipSet<i64, Ascending> = SkipSet::new();
                for i in 0..size {
                    black_box(set.add(i));
                }
            });
        });
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    for size in [100, 1_000, 10_000].iter() {
        let set: SkipSet<i64, Ascending> = SkipSet::new();
        for i in 0..*size {
            set.add(i);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let probe = size / 2;
            b.iter(|| black_box(set.contains(&probe)));
        });
    }
    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_90_9_1");
    for threads in [1, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, &threads| {
            let set = Arc::new(SkipSet::<i64, Ascending>::new());
            for i in 0..10_000 {
                set.add(i);
            }
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let set = Arc::clone(&set);
                        thread::spawn(move || {
                            for i in 0..1_000 {
                                let key = ((t * 1_000 + i) % 10_000) as i64;
                                match i % 100 {
                                    0..=88 => {
                                        black_box(set.contains(&key));
                                    }
                                    89..=97 => {
                                        black_box(set.add(key));
                                    }
                                    _ => {
                                        black_box(set.remove(&key));
                                    }
                                }
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_contains, bench_mixed_workload);
criterion_main!(benches);
