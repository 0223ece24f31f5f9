//! Paced capture loop example.
//!
//! Simulates a device read loop held to a 20ms cadence. Each iteration
//! does a random amount of "processing"; the pacer sleeps off whatever is
//! left of the period, and occasionally a long stall forces it to skip
//! periods and report the iteration late.

use rand::Rng;
use std::time::{Duration, Instant};
use threadflow::pacing::AdaptiveDelay;

fn main() {
    env_logger::init();

    let period = Duration::from_millis(20);
    let mut pacer = AdaptiveDelay::new(Duration::from_millis(60), Duration::from_millis(2));
    let mut rng = rand::thread_rng();

    let start = Instant::now();
    let mut captured = 0usize;
    let mut dropped = 0usize;

    for frame in 0..100 {
        let late = pacer.delay(period);
        if late {
            dropped += 1;
            log::warn!("frame {} dropped, loop fell behind", frame);
            continue;
        }

        // Simulated capture and processing, 1..15ms, with a rare stall.
        let work_ms = if rng.gen_ratio(1, 25) {
            90
        } else {
            rng.gen_range(1..15)
        };
        std::thread::sleep(Duration::from_millis(work_ms));
        captured += 1;
    }

    let elapsed = start.elapsed();
    println!(
        "captured {} frames, dropped {}, in {:.2}s (target cadence {:?})",
        captured,
        dropped,
        elapsed.as_secs_f64(),
        period
    );
}
