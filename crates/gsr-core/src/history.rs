//! Receiver-side rolling history
//!
//! The device itself keeps nothing between iterations. A paired receiver
//! usually wants a short trailing window per sensor to plot or smooth, so
//! this keeps the last `N` values of each input, oldest evicted first.

use heapless::Deque;

use crate::reading::{RawReading, ReadingPair};

/// Values kept per sensor by default
pub const HISTORY_DEPTH: usize = 30;

/// Statistics over one sensor's window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub min: RawReading,
    pub max: RawReading,
    /// Integer mean, truncated
    pub avg: RawReading,
    pub count: usize,
}

impl WindowStats {
    fn from_values<'a>(values: impl Iterator<Item = &'a RawReading>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0u64;
        let mut min = RawReading::MAX;
        let mut max = RawReading::MIN;

        for &value in values {
            count += 1;
            sum += u64::from(value);
            min = min.min(value);
            max = max.max(value);
        }

        let divisor = u64::try_from(count).ok().filter(|&n| n > 0)?;
        // The mean of u16 values always fits back into a u16
        let avg = RawReading::try_from(sum / divisor).unwrap_or(RawReading::MAX);

        Some(Self {
            min,
            max,
            avg,
            count,
        })
    }
}

/// Trailing window of received reading pairs
pub struct ReadingHistory<const N: usize = HISTORY_DEPTH> {
    first: Deque<RawReading, N>,
    second: Deque<RawReading, N>,
}

impl<const N: usize> ReadingHistory<N> {
    pub const fn new() -> Self {
        Self {
            first: Deque::new(),
            second: Deque::new(),
        }
    }

    /// Append a pair, evicting the oldest once the window is full.
    pub fn push(&mut self, pair: ReadingPair) {
        push_evicting(&mut self.first, pair.first);
        push_evicting(&mut self.second, pair.second);
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    pub fn latest(&self) -> Option<ReadingPair> {
        Some(ReadingPair::new(*self.first.back()?, *self.second.back()?))
    }

    /// Pairs oldest first
    pub fn iter(&self) -> impl Iterator<Item = ReadingPair> + '_ {
        self.first
            .iter()
            .zip(self.second.iter())
            .map(|(&first, &second)| ReadingPair::new(first, second))
    }

    /// Per-sensor statistics, `None` while empty.
    pub fn stats(&self) -> Option<(WindowStats, WindowStats)> {
        Some((
            WindowStats::from_values(self.first.iter())?,
            WindowStats::from_values(self.second.iter())?,
        ))
    }

    pub fn clear(&mut self) {
        self.first.clear();
        self.second.clear();
    }
}

impl<const N: usize> Default for ReadingHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn push_evicting<const N: usize>(window: &mut Deque<RawReading, N>, value: RawReading) {
    if window.is_full() {
        window.pop_front();
    }
    // Cannot fail: a slot was just freed if needed
    let _ = window.push_back(value);
}
