//! Shared time budget for one orchestration call.

use std::time::{Duration, Instant};

/// Number of `expired` calls between clock samples. Sampling the monotonic
/// clock on every leaf visit is measurable overhead on hot paths.
const CHECK_PERIOD: u32 = 16;

/// A monotonically decreasing time budget.
///
/// The deadline is passed by mutable reference into every sub-operation and
/// checked at least once per leaf visited and once per filter evaluated.
/// Expiry is latched: once expired, every later check reports expired.
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
    calls: u32,
    expired: bool,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
            calls: 0,
            expired: budget.is_zero(),
        }
    }

    /// Check the budget. The clock is only sampled every few calls; a zero
    /// budget reports expiry on the first check.
    pub fn expired(&mut self) -> bool {
        if self.expired {
            return true;
        }
        if self.calls == 0 {
            self.expired = self.start.elapsed() >= self.budget;
        }
        self.calls = (self.calls + 1) % CHECK_PERIOD;
        self.expired
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}
