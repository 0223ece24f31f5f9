//! Benchmarks for pool dispatch and channel transfer throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use threadflow::prelude::*;

fn bench_pool_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_dispatch");

    for worker_cap in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("submit_1000", worker_cap),
            &worker_cap,
            |b, &cap| {
                b.iter_batched(
                    || WorkerPool::with_max_workers(cap).expect("Failed to create pool"),
                    |pool| {
                        let counter = Arc::new(AtomicUsize::new(0));
                        for _ in 0..1000 {
                            let counter = Arc::clone(&counter);
                            pool.execute(move || {
                                counter.fetch_add(1, Ordering::Relaxed);
                            })
                            .expect("Failed to submit item");
                        }
                        while counter.load(Ordering::Relaxed) < 1000 {
                            thread::yield_now();
                        }
                        pool.shutdown();
                    },
                    criterion::BatchSize::PerIteration,
                );
            },
        );
    }

    group.finish();
}

fn bench_channel_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_transfer");
    const TOTAL: usize = 1 << 20;

    for capacity in [256usize, 4096, 65536] {
        group.throughput(Throughput::Bytes(TOTAL as u64));
        group.bench_with_input(
            BenchmarkId::new("one_mib", capacity),
            &capacity,
            |b, &cap| {
                b.iter(|| {
                    let ch = Arc::new(BoundedChannel::new(cap));

                    let producer = {
                        let ch = Arc::clone(&ch);
                        thread::spawn(move || {
                            let chunk = [0x42u8; 1024];
                            for _ in 0..TOTAL / chunk.len() {
                                ch.write_all(&chunk).expect("write failed");
                            }
                            ch.close();
                        })
                    };

                    let mut buf = [0u8; 1024];
                    let mut received = 0usize;
                    loop {
                        match ch.read(&mut buf) {
                            Ok(n) => received += n,
                            Err(ChannelError::Closed) => break,
                            Err(e) => panic!("read failed: {e}"),
                        }
                    }
                    producer.join().expect("producer panicked");
                    assert_eq!(received, TOTAL);
                    black_box(received)
                });
            },
        );
    }

    group.finish();
}

fn bench_pacing_overhead(c: &mut Criterion) {
    use std::time::Duration;

    c.bench_function("adaptive_delay_on_time", |b| {
        let mut pacer = AdaptiveDelay::new(Duration::ZERO, Duration::from_millis(1));
        b.iter(|| {
            // Sub-floor periods: the drift arithmetic runs but no sleep does.
            black_box(pacer.delay(Duration::from_nanos(1)));
        });
    });
}

criterion_group!(
    benches,
    bench_pool_dispatch,
    bench_channel_transfer,
    bench_pacing_overhead
);
criterion_main!(benches);
