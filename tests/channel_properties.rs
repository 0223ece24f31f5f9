//! Property-based tests for the bounded channel using proptest

use proptest::prelude::*;
use std::time::Duration;
use threadflow::prelude::*;

fn test_channel(capacity: usize) -> BoundedChannel {
    BoundedChannel::with_config(
        ChannelConfig::new(capacity)
            .with_read_timeout(Duration::from_millis(20))
            .with_write_timeout(Duration::from_millis(20)),
    )
}

proptest! {
    /// The buffered length never exceeds capacity, and equals bytes
    /// written minus bytes read, across arbitrary interleavings of
    /// partial writes and reads.
    #[test]
    fn prop_length_bounded_and_conserved(
        capacity in 1usize..64,
        ops in prop::collection::vec((any::<bool>(), 1usize..32), 1..100)
    ) {
        let ch = test_channel(capacity);
        let mut written = 0usize;
        let mut read = 0usize;

        for (is_write, size) in ops {
            if is_write {
                match ch.write(&vec![0xA5; size]) {
                    Ok(n) => {
                        prop_assert!(n >= 1);
                        written += n;
                    }
                    Err(ChannelError::Timeout) => {
                        // Single-threaded: only a full buffer times out.
                        prop_assert_eq!(ch.len(), capacity);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected {e}"))),
                }
            } else {
                let mut buf = vec![0u8; size];
                match ch.read(&mut buf) {
                    Ok(n) => {
                        prop_assert!(n >= 1);
                        read += n;
                    }
                    Err(ChannelError::Timeout) => {
                        prop_assert_eq!(ch.len(), 0);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected {e}"))),
                }
            }
            prop_assert!(ch.len() <= capacity);
            prop_assert_eq!(ch.len(), written - read);
        }
    }

    /// Bytes come out in exactly the order they went in, with no loss or
    /// duplication, regardless of how transfers are chunked.
    #[test]
    fn prop_fifo_no_loss_no_duplication(
        capacity in 1usize..32,
        payload in prop::collection::vec(any::<u8>(), 1..512),
        read_chunk in 1usize..16
    ) {
        let ch = test_channel(capacity);
        let mut sent = 0usize;
        let mut received = Vec::with_capacity(payload.len());
        let mut buf = vec![0u8; read_chunk];

        // Alternate partial writes and reads so the cursors wrap many
        // times within a small physical buffer.
        while received.len() < payload.len() {
            if sent < payload.len() {
                if let Ok(n) = ch.write(&payload[sent..]) {
                    sent += n;
                }
            }
            if let Ok(n) = ch.read(&mut buf) {
                received.extend_from_slice(&buf[..n]);
            }
        }

        prop_assert_eq!(received, payload);
    }

    /// A write never claims more bytes than fit, and a full channel
    /// accepts exactly the free space.
    #[test]
    fn prop_partial_write_reports_transferred(
        capacity in 1usize..32,
        size in 1usize..64
    ) {
        let ch = test_channel(capacity);
        let n = ch.write(&vec![1u8; size]).unwrap();
        prop_assert_eq!(n, size.min(capacity));
        prop_assert_eq!(ch.len(), n);
    }

    /// Closing always reports the transition exactly once and leaves
    /// every subsequent operation failing with Closed.
    #[test]
    fn prop_close_terminal(capacity in 1usize..32, preload in 0usize..8) {
        let ch = test_channel(capacity);
        if preload > 0 {
            let _ = ch.write(&vec![9u8; preload]);
        }

        prop_assert!(ch.close());
        prop_assert!(!ch.close());

        let mut buf = [0u8; 4];
        prop_assert_eq!(ch.read(&mut buf), Err(ChannelError::Closed));
        prop_assert_eq!(ch.write(b"x"), Err(ChannelError::Closed));
    }
}
