//! Time-Bounded Window Implementation

use std::collections::VecDeque;

/// Anything that can be placed in a [`TimeWindow`]
pub trait Timestamped {
    fn timestamp_ms(&self) -> u64;
}

/// Worst-case number of entries a window holds for a given frame rate.
///
/// Use it to pre-size windows; the window itself never rejects entries.
pub fn expected_capacity(horizon_ms: u64, fps: u32) -> usize {
    (horizon_ms as usize * fps as usize) / 1000 + 1
}

/// Rolling window pruned by age rather than by count.
///
/// Entries are appended at the tail in non-decreasing timestamp order and
/// evicted from the head once `now - oldest > horizon`.
#[derive(Debug, Clone)]
pub struct TimeWindow<T> {
    entries: VecDeque<T>,
    horizon_ms: u64,
}

impl<T: Timestamped> TimeWindow<T> {
    /// Create an empty window with the given horizon (milliseconds)
    pub fn new(horizon_ms: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            horizon_ms,
        }
    }

    /// Create an empty window pre-sized for `fps` frames per second
    pub fn with_frame_rate(horizon_ms: u64, fps: u32) -> Self {
        Self {
            entries: VecDeque::with_capacity(expected_capacity(horizon_ms, fps)),
            horizon_ms,
        }
    }

    /// Append an entry at the tail
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Drop entries older than the horizon relative to `now_ms`.
    ///
    /// Returns the number of evicted entries. A timestamp ahead of `now_ms`
    /// counts as age zero.
    pub fn evict(&mut self, now_ms: u64) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.entries.front() {
            if now_ms.saturating_sub(front.timestamp_ms()) > self.horizon_ms {
                self.entries.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        evicted
    }

    /// Time covered between the oldest and newest entry
    pub fn span_ms(&self) -> u64 {
        match (self.entries.front(), self.entries.back()) {
            (Some(first), Some(last)) => last.timestamp_ms().saturating_sub(first.timestamp_ms()),
            _ => 0,
        }
    }

    /// Time elapsed from the oldest entry up to `now_ms`
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        self.entries
            .front()
            .map(|first| now_ms.saturating_sub(first.timestamp_ms()))
            .unwrap_or(0)
    }

    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn horizon_ms(&self) -> u64 {
        self.horizon_ms
    }

    /// Remove every entry, keeping the allocation
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
