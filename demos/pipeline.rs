//! Two-stage pipeline example.
//!
//! A worker pool parses simulated requests and streams the results into a
//! bounded channel; a single consumer thread drains the channel and prints
//! a running total. Run with `RUST_LOG=debug` to watch workers come and go.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use threadflow::prelude::*;

struct LoggingObserver;

impl PoolObserver for LoggingObserver {
    fn on_worker_started(&self, worker_id: usize) {
        log::info!("worker {} started", worker_id);
    }
    fn on_worker_stopped(&self, worker_id: usize) {
        log::info!("worker {} stopped", worker_id);
    }
    fn on_items_dropped(&self, worker_id: usize, count: usize) {
        log::warn!("worker {}: {} item(s) dropped at shutdown", worker_id, count);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = PoolConfig::new(4)
        .with_thread_name_prefix("parse")
        .with_observer(Arc::new(LoggingObserver));
    let pool = WorkerPool::with_config(config)?;

    let channel = Arc::new(BoundedChannel::new(256));
    let requests = 50usize;
    let submitted = Arc::new(AtomicUsize::new(0));

    let consumer = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            let mut total = 0usize;
            let mut buf = [0u8; 64];
            loop {
                match channel.read(&mut buf) {
                    Ok(n) => {
                        total += n;
                        println!("consumed {} bytes ({} total)", n, total);
                    }
                    Err(ChannelError::Closed) => return total,
                    Err(ChannelError::Timeout) => {
                        log::warn!("consumer idle, still waiting");
                    }
                }
            }
        })
    };

    for request_id in 0..requests {
        let channel = Arc::clone(&channel);
        let submitted = Arc::clone(&submitted);
        pool.submit(ClosureWork::new(move || {
            // Pretend to parse, then emit a small result record.
            thread::sleep(Duration::from_millis(5));
            let record = format!("req-{:04};", request_id);
            channel
                .write_all(record.as_bytes())
                .expect("pipeline channel closed early");
            submitted.fetch_add(1, Ordering::Relaxed);
        }))?;
    }

    while submitted.load(Ordering::Relaxed) < requests {
        thread::sleep(Duration::from_millis(10));
    }
    channel.close();

    let total = consumer.join().expect("consumer panicked");
    println!(
        "pipeline done: {} requests, {} bytes, {} items processed",
        requests,
        total,
        pool.total_items_processed()
    );

    pool.shutdown();
    Ok(())
}
