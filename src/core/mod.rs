//! Core types and traits shared by the pool and channel primitives

pub mod error;
pub mod work;

pub use error::{ChannelError, ChannelResult, PoolError, Result};
pub use work::{BoxedWorkItem, ClosureWork, WorkItem};
