//! # Collections Benchmark
//!
//! Throughput of the gated containers, plus the one algorithmic claim worth
//! guarding: `remove_where` must stay a single O(n) compaction, not decay
//! into repeated single-element removal.
//!
//! Run with: `cargo bench --package hydra_collections`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hydra_collections::{ConcurrentList, ConcurrentQueue};

fn bench_list_push(c: &mut Criterion) {
    c.bench_function("list_push_10k", |b| {
        b.iter(|| {
            let list = ConcurrentList::new();
            for i in 0..10_000u32 {
                list.push(black_box(i));
            }
            black_box(list.len())
        });
    });
}

fn bench_queue_cycle(c: &mut Criterion) {
    c.bench_function("queue_enqueue_dequeue_10k", |b| {
        b.iter(|| {
            let queue = ConcurrentQueue::with_capacity(64);
            for i in 0..10_000u32 {
                queue.enqueue(black_box(i));
                if i % 3 == 0 {
                    // Keep the live region wrapping.
                    black_box(queue.try_dequeue());
                }
            }
            while queue.try_dequeue().is_some() {}
        });
    });
}

/// Single-pass compaction against the naive scan-and-remove loop it
/// replaces. The gap should widen linearly with element count.
fn bench_bulk_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_conditional_removal");

    for size in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("remove_where", size), &size, |b, &size| {
            b.iter(|| {
                let list: ConcurrentList<usize> = (0..size).collect();
                let removed = list.remove_where(|x| x % 2 == 0);
                black_box(removed)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("repeated_remove_at", size),
            &size,
            |b, &size| {
                b.iter(|| {
                    let list: ConcurrentList<usize> = (0..size).collect();
                    let mut index = 0;
                    while index < list.len() {
                        if list.get(index).unwrap() % 2 == 0 {
                            list.remove_at(index).unwrap();
                        } else {
                            index += 1;
                        }
                    }
                    black_box(list.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_list_push, bench_queue_cycle, bench_bulk_removal);
criterion_main!(benches);
