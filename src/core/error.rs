//! Error types for the pool and channel primitives

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    Spawn {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// A worker thread did not terminate within the bounded shutdown wait
    #[error("Worker thread #{worker_id} did not terminate within {waited_ms}ms")]
    JoinTimeout {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// How long the pool waited, in milliseconds
        waited_ms: u64,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl PoolError {
    /// Create a spawn error
    pub fn spawn(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::Spawn {
            worker_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::Spawn {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join timeout error
    pub fn join_timeout(worker_id: usize, waited_ms: u64) -> Self {
        PoolError::JoinTimeout {
            worker_id,
            waited_ms,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Failure reasons for blocking channel operations.
///
/// These are the only two ways a `read` or `write` can fail: the bounded
/// wait elapsed with no progress, or the channel transitioned to its
/// terminal closed state. Retry policy belongs to the caller; the channel
/// never retries internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The configured wait elapsed without transferring any bytes
    #[error("channel operation timed out")]
    Timeout,

    /// The channel was closed before or during the operation
    #[error("channel is closed")]
    Closed,
}

/// Result type for channel operations
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;
