//! Thread-safe sequence counter for numbering published scans.
//!
//! # Why number scans? (for beginners)
//!
//! A host may fan each scan out to several consumers (a log, a screen, a
//! business-logic handler).  A monotonically increasing *sequence number* on
//! every published scan lets a consumer notice that it missed one (it saw 4
//! and then 6) and lets logs from different consumers be lined up.
//!
//! The counter uses `AtomicU64`, so a shared `Arc<SequenceCounter>` can be
//! advanced from any thread without a lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing counter.
///
/// Starts at 0 and wraps around at `u64::MAX` without panicking.
///
/// # Examples
///
/// ```rust
/// use scan_core::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
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

    /// Returns the next sequence number and advances the counter.
    ///
    /// `Relaxed` ordering is enough: the number only orders scans, it does not
    /// publish other memory.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`next`](Self::next) will return.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
