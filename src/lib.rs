//! # threadflow
//!
//! Concurrency and flow-control primitives for protocol servers and
//! device I/O pipelines: a dynamic worker pool with load-aware placement,
//! a bounded byte channel, and an adaptive pacing helper.
//!
//! ## Features
//!
//! - **Worker Pool**: dynamically sized pool that places each work item on
//!   the least-loaded worker, grows on demand up to configurable bounds,
//!   retires idle workers, and tears down with bounded joins
//! - **Bounded Channel**: fixed-capacity byte ring buffer with blocking,
//!   timed, partial-transfer reads and writes and a close signal that
//!   unblocks every waiter
//! - **Adaptive Delay**: drift-corrected pacing for periodic loops, with
//!   bounded catch-up after stalls
//! - **Thread Safety**: built on parking_lot locks with a fixed
//!   pool-then-worker lock order
//!
//! ## Quick Start
//!
//! ```rust
//! use threadflow::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Create a pool; workers are spawned on demand.
//! let pool = WorkerPool::with_max_workers(4)?;
//!
//! // Submit work items, e.g. one per accepted connection.
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("handling unit {}", i);
//!     })?;
//! }
//!
//! // Joins every worker; queued-but-unstarted items are dropped.
//! pool.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Producer/Consumer Handoff
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use threadflow::channel::BoundedChannel;
//! use threadflow::core::ChannelError;
//!
//! let ch = Arc::new(BoundedChannel::new(1024));
//!
//! let producer = {
//!     let ch = Arc::clone(&ch);
//!     thread::spawn(move || {
//!         ch.write_all(b"frame data").unwrap();
//!         ch.close(); // end-of-stream
//!     })
//! };
//!
//! let mut received = Vec::new();
//! let mut buf = [0u8; 64];
//! loop {
//!     match ch.read(&mut buf) {
//!         Ok(n) => received.extend_from_slice(&buf[..n]),
//!         Err(ChannelError::Closed) => break,
//!         Err(ChannelError::Timeout) => continue,
//!     }
//! }
//! producer.join().unwrap();
//! assert_eq!(received, b"frame data");
//! ```
//!
//! ## Paced Loops
//!
//! ```rust
//! use std::time::Duration;
//! use threadflow::pacing::AdaptiveDelay;
//!
//! let mut pacer = AdaptiveDelay::new(Duration::from_millis(50), Duration::from_millis(2));
//! for _ in 0..3 {
//!     let late = pacer.delay(Duration::from_millis(5));
//!     if late {
//!         continue; // fell a full period behind: skip this iteration's work
//!     }
//!     // ... read the next unit of data ...
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod core;
pub mod pacing;
pub mod pool;
pub mod prelude;

pub use crate::channel::{BoundedChannel, ChannelConfig};
pub use crate::core::{
    BoxedWorkItem, ChannelError, ChannelResult, ClosureWork, PoolError, Result, WorkItem,
};
pub use crate::pacing::AdaptiveDelay;
pub use crate::pool::{PoolConfig, PoolObserver, WorkerPool, WorkerStats};
