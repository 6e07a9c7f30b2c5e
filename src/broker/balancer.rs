//! Round-robin partition selection.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Cycles through partitions evenly across successive calls.
///
/// # Memory Ordering
///
/// The cursor uses `Ordering::Relaxed`: concurrent callers only need distinct
/// consecutive values, not ordering relative to other memory.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the next partition out of `partitions`.
    ///
    /// Returns `None` when the topic has no partitions to choose from.
    pub fn next(&self, partitions: i32) -> Option<i32> {
        let count = usize::try_from(partitions).ok().filter(|&n| n > 0)?;
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % count;
        i32::try_from(slot).ok()
    }
}
