//! Thread-safe sequence counter for transport frame numbering.
//!
//! # What is a sequence number? (for beginners)
//!
//! Every frame put on a transport channel carries a monotonically increasing
//! integer called a *sequence number*.  Sequence numbers are used to:
//!
//! - **Check ordering** – the transport channel promises FIFO delivery from
//!   one sender; a receiver can assert that frame numbers only go up.
//! - **Tell attachments apart** – numbering restarts at 0 every time an
//!   output surface attaches, so frame 0 is always the first frame that
//!   surface ever saw (normally the head of the resync burst).
//!
//! # Thread safety
//!
//! The counter uses `AtomicU64` internally, so two threads can both call
//! `next()` at once without producing the same value twice.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing counter for frame sequence numbers.
///
/// Sequence numbers start at 0 and increment by 1 with each call to [`next`].
/// The counter wraps around at `u64::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use lectern_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// counter.reset();
/// assert_eq!(counter.next(), 0);
/// ```
///
/// [`next`]: SequenceCounter::next
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next sequence number and atomically increments the counter.
    ///
    /// `Ordering::Relaxed`: the numbers label frames, they do not publish
    /// any other memory.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without incrementing.
    ///
    /// Equal to the number of frames numbered since the last reset.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Restarts numbering at 0.  Called when a new receiver attaches.
    pub fn reset(&self) {
        self.inner.store(0, Ordering::Relaxed);
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 0);
    }

    #[test]
    fn test_sequence_counter_wraps_at_u64_max() {
        // Arrange – start the counter one step before overflow
        let counter = SequenceCounter {
            inner: AtomicU64::new(u64::MAX),
        };

        // Act
        let before_wrap = counter.next();
        let after_wrap = counter.next();

        // Assert
        assert_eq!(before_wrap, u64::MAX);
        assert_eq!(after_wrap, 0, "counter must wrap to 0 after u64::MAX");
    }

    #[test]
    fn test_sequence_counter_is_unique_across_threads() {
        // Arrange
        let counter = Arc::new(SequenceCounter::new());

        // Act
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..250).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn test_reset_restarts_numbering() {
        // Arrange
        let counter = SequenceCounter::new();
        counter.next();
        counter.next();

        // Act
        counter.reset();

        // Assert
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.next(), 0);
    }
}
