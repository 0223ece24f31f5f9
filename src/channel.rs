//! Bounded byte channel with blocking, timed, partial-transfer I/O.
//!
//! [`BoundedChannel`] is a fixed-capacity ring buffer shared between a
//! producer side and a consumer side. `read` and `write` block with a
//! configurable timeout, and a single call may transfer fewer bytes than
//! requested: progress means "at least one byte moved", which keeps
//! variable-sized reads and writes on the same buffer from deadlocking
//! each other. [`close`](BoundedChannel::close) is the one cancellation
//! primitive; it wakes every blocked call on either side.

use crate::core::{ChannelError, ChannelResult};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Configuration for a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Buffer capacity in bytes (0 constructs the channel closed)
    pub capacity: usize,
    /// Maximum wait for data in `read`.
    /// Default: 10 seconds
    pub read_timeout: Duration,
    /// Maximum wait for free space in `write`.
    /// Default: 10 seconds
    pub write_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl ChannelConfig {
    /// Create a configuration with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set the read timeout
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// Cursors, length and closed flag, all owned by the channel's one lock.
/// Buffer copies happen under the lock as well; cursor arithmetic is never
/// observable mid-update.
struct Ring {
    buf: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
    len: usize,
    closed: bool,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

/// A fixed-capacity, thread-safe byte ring buffer.
///
/// Typically shared by reference between one producer and one consumer;
/// multiple producers or consumers are legal but compete for the same
/// buffer under one lock.
///
/// # Example
///
/// ```rust
/// use threadflow::channel::BoundedChannel;
///
/// let ch = BoundedChannel::new(4);
///
/// // A 6-byte write only transfers what fits.
/// let written = ch.write(b"abcdef").unwrap();
/// assert_eq!(written, 4);
///
/// let mut buf = [0u8; 8];
/// let read = ch.read(&mut buf).unwrap();
/// assert_eq!(&buf[..read], b"abcd");
/// ```
pub struct BoundedChannel {
    ring: Mutex<Ring>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl std::fmt::Debug for BoundedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("BoundedChannel")
            .field("capacity", &ring.capacity())
            .field("len", &ring.len)
            .field("closed", &ring.closed)
            .finish()
    }
}

impl BoundedChannel {
    /// Create a channel with the given capacity and default timeouts.
    ///
    /// A capacity of 0 constructs the channel already closed.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(ChannelConfig::new(capacity))
    }

    /// Create a channel from a configuration
    pub fn with_config(config: ChannelConfig) -> Self {
        let closed = config.capacity == 0;
        Self {
            ring: Mutex::new(Ring {
                buf: vec![0; config.capacity].into_boxed_slice(),
                read_pos: 0,
                write_pos: 0,
                len: 0,
                closed,
                read_timeout: config.read_timeout,
                write_timeout: config.write_timeout,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// (Re)initialize the channel with a fresh buffer.
    ///
    /// Resets the cursors, clears the closed flag and wakes any thread
    /// waiting for the channel to become usable. This is the only way back
    /// from the closed state. Returns `false` if `capacity` is 0, which
    /// leaves the channel closed.
    pub fn open(&self, capacity: usize) -> bool {
        {
            let mut ring = self.ring.lock();
            ring.read_pos = 0;
            ring.write_pos = 0;
            ring.len = 0;
            if capacity == 0 {
                ring.buf = Vec::new().into_boxed_slice();
                ring.closed = true;
                return false;
            }
            ring.buf = vec![0; capacity].into_boxed_slice();
            ring.closed = false;
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    /// Read up to `buf.len()` bytes, blocking until data arrives.
    ///
    /// Blocks up to the read timeout while the channel is open and empty.
    /// A single call transfers at most the contiguous run up to the
    /// buffer's wrap point, so it may return fewer bytes than requested
    /// even when more are queued; use [`read_exact`](Self::read_exact) or
    /// loop for an exact count.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Timeout`] if no data arrived within the timeout
    /// - [`ChannelError::Closed`] if the channel is or becomes closed
    ///
    /// # Panics
    ///
    /// Panics if `buf` is empty.
    pub fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        assert!(!buf.is_empty(), "read buffer must not be empty");

        let mut ring = self.ring.lock();
        let deadline = Instant::now() + ring.read_timeout;
        while ring.len == 0 {
            if ring.closed {
                return Err(ChannelError::Closed);
            }
            if self.not_empty.wait_until(&mut ring, deadline).timed_out() && ring.len == 0 {
                return Err(if ring.closed {
                    ChannelError::Closed
                } else {
                    ChannelError::Timeout
                });
            }
        }

        let capacity = ring.capacity();
        let contiguous = capacity - ring.read_pos;
        let n = ring.len.min(buf.len()).min(contiguous);
        let start = ring.read_pos;
        buf[..n].copy_from_slice(&ring.buf[start..start + n]);

        let was_full = ring.len == capacity;
        ring.read_pos = (ring.read_pos + n) % capacity;
        ring.len -= n;
        drop(ring);

        if was_full {
            self.not_full.notify_all();
        }
        Ok(n)
    }

    /// Write up to `data.len()` bytes, blocking until space is free.
    ///
    /// Blocks up to the write timeout while the channel is open and full.
    /// A single call transfers at most the free contiguous run up to the
    /// wrap point; use [`write_all`](Self::write_all) or loop to push an
    /// exact count.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Timeout`] if no space freed up within the timeout
    /// - [`ChannelError::Closed`] if the channel is or becomes closed
    ///
    /// # Panics
    ///
    /// Panics if `data` is empty.
    pub fn write(&self, data: &[u8]) -> ChannelResult<usize> {
        assert!(!data.is_empty(), "write data must not be empty");

        let mut ring = self.ring.lock();
        let deadline = Instant::now() + ring.write_timeout;
        loop {
            if ring.closed {
                return Err(ChannelError::Closed);
            }
            if ring.len < ring.capacity() {
                break;
            }
            if self.not_full.wait_until(&mut ring, deadline).timed_out()
                && ring.len == ring.capacity()
            {
                return Err(if ring.closed {
                    ChannelError::Closed
                } else {
                    ChannelError::Timeout
                });
            }
        }

        let capacity = ring.capacity();
        let contiguous = capacity - ring.write_pos;
        let free = capacity - ring.len;
        let n = free.min(data.len()).min(contiguous);
        let start = ring.write_pos;
        ring.buf[start..start + n].copy_from_slice(&data[..n]);

        let was_empty = ring.len == 0;
        ring.write_pos = (ring.write_pos + n) % capacity;
        ring.len += n;
        drop(ring);

        if was_empty {
            self.not_empty.notify_all();
        }
        Ok(n)
    }

    /// Read exactly `buf.len()` bytes by looping over partial reads.
    ///
    /// Bytes already transferred stay consumed if an error cuts the loop
    /// short.
    pub fn read_exact(&self, buf: &mut [u8]) -> ChannelResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            filled += self.read(&mut buf[filled..])?;
        }
        Ok(())
    }

    /// Write all of `data` by looping over partial writes.
    ///
    /// Bytes already transferred stay written if an error cuts the loop
    /// short.
    pub fn write_all(&self, data: &[u8]) -> ChannelResult<()> {
        let mut written = 0;
        while written < data.len() {
            written += self.write(&data[written..])?;
        }
        Ok(())
    }

    /// Close the channel and wake every blocked reader and writer.
    ///
    /// The buffer is released and all subsequent (and in-flight) calls
    /// fail with [`ChannelError::Closed`]. Returns `false` if the channel
    /// was already closed. [`open`](Self::open) re-initializes a closed
    /// channel.
    pub fn close(&self) -> bool {
        {
            let mut ring = self.ring.lock();
            if ring.closed {
                return false;
            }
            ring.closed = true;
            ring.buf = Vec::new().into_boxed_slice();
            ring.read_pos = 0;
            ring.write_pos = 0;
            ring.len = 0;
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    /// True if the channel has been closed
    pub fn is_closed(&self) -> bool {
        self.ring.lock().closed
    }

    /// Number of bytes currently buffered
    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    /// True if no bytes are buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer capacity in bytes (0 once closed)
    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Set the maximum wait for data in `read`
    pub fn set_read_timeout(&self, timeout: Duration) {
        self.ring.lock().read_timeout = timeout;
    }

    /// Set the maximum wait for free space in `write`
    pub fn set_write_timeout(&self, timeout: Duration) {
        self.ring.lock().write_timeout = timeout;
    }
}
