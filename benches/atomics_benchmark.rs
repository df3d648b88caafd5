use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memorder::{process_fence, thread_fence, AtomicCell, MemoryOrder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

const ORDERS: [MemoryOrder; 4] = [
    MemoryOrder::Relax,
    MemoryOrder::Acquire,
    MemoryOrder::SeqCst,
    MemoryOrder::Strong,
];

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");

    // Baseline
    group.bench_function("std fetch_add SeqCst", |b| {
        let cell = AtomicU64::new(0);
        b.iter(|| black_box(cell.fetch_add(black_box(1), Ordering::SeqCst)));
    });

    for order in ORDERS {
        let label = format!("{order:?}");

        group.bench_with_input(BenchmarkId::new("load u64", &label), &order, |b, &order| {
            let cell = AtomicCell::new(7u64);
            b.iter(|| black_box(cell.load(order)));
        });

        group.bench_with_input(BenchmarkId::new("store u32", &label), &order, |b, &order| {
            let cell = AtomicCell::new(0u32);
            b.iter(|| cell.store(black_box(1), order));
        });

        group.bench_with_input(BenchmarkId::new("fetch_add u64", &label), &order, |b, &order| {
            let cell = AtomicCell::new(0u64);
            b.iter(|| black_box(cell.fetch_add(black_box(1), order)));
        });

        group.bench_with_input(BenchmarkId::new("compare_and_swap usize", &label), &order, |b, &order| {
            let cell = AtomicCell::new(0usize);
            b.iter(|| black_box(cell.compare_and_swap(black_box(0), black_box(0), order)));
        });
    }

    group.finish();
}

fn bench_fences(c: &mut Criterion) {
    let mut group = c.benchmark_group("fences");

    group.bench_function("thread_fence SeqCst", |b| {
        b.iter(|| thread_fence(black_box(MemoryOrder::SeqCst)));
    });

    group.bench_function("process_fence", |b| {
        // Detection happens once, outside the measurement.
        process_fence();
        b.iter(process_fence);
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    const OPS: u64 = 10_000;

    for threads in [2u64, 4] {
        group.throughput(Throughput::Elements(threads * OPS));
        group.bench_with_input(BenchmarkId::new("fetch_add SeqCst", threads), &threads, |b, &threads| {
            b.iter(|| {
                let cell = AtomicCell::new(0u64);
                thread::scope(|s| {
                    for _ in 0..threads {
                        s.spawn(|| {
                            for _ in 0..OPS {
                                cell.fetch_add(1, MemoryOrder::SeqCst);
                            }
                        });
                    }
                });
                black_box(cell.into_inner())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_fences, bench_contended);
criterion_main!(benches);
