//! Convenient re-exports for common types and traits

pub use crate::channel::{BoundedChannel, ChannelConfig};
pub use crate::core::{
    BoxedWorkItem, ChannelError, ChannelResult, ClosureWork, PoolError, Result, WorkItem,
};
pub use crate::pacing::AdaptiveDelay;
pub use crate::pool::{PoolConfig, PoolObserver, WorkerPool, WorkerStats};
