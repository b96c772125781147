//! Per-connection sliding-window rate limiter
//!
//! Owned by the inbound pump, so it needs no locking. A frame over the limit
//! is delayed, not dropped: `try_acquire` reports how long to wait until the
//! oldest hit leaves the window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SlidingWindow {
    max: usize,
    window: Duration,
    hits: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(max: u32, window: Duration) -> Self {
        let max = usize::try_from(max).unwrap_or(usize::MAX).max(1);
        Self {
            max,
            window,
            hits: VecDeque::with_capacity(max.min(1024)),
        }
    }

    fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a hit at `now` if the window has room
    ///
    /// Returns `Err(wait)` with the time until a slot frees up otherwise.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.expire(now);
        if self.hits.len() < self.max {
            self.hits.push_back(now);
            return Ok(());
        }
        let oldest = self.hits.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    /// Hits currently inside the window
    pub fn in_window(&mut self, now: Instant) -> usize {
        self.expire(now);
        self.hits.len()
    }
}
