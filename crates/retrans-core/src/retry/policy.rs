use std::time::Duration;

/// First wait between attempts.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff parameters shared by all calls of one retry transport.
///
/// Waits follow a Fibonacci recurrence starting from `initial`:
/// 500ms, 1s, 1.5s, 2.5s, 4s, 6.5s, 10.5s, ... There is no jitter. `max`
/// caps a single wait; it is unset by default, leaving the overall deadline
/// as the only bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSchedule {
    pub initial: Duration,
    pub max: Option<Duration>,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            initial: INITIAL_BACKOFF,
            max: None,
        }
    }
}

impl BackoffSchedule {
    /// Fresh state for one retry loop.
    pub fn start(&self) -> Backoff {
        Backoff {
            current: self.initial,
            next: self.initial,
            max: self.max,
        }
    }
}

/// Backoff state of a single retry loop: `(current, next)`, advanced once per
/// retry as `current' = current + next`, `next' = current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
    next: Duration,
    max: Option<Duration>,
}

impl Backoff {
    /// Wait before the next attempt.
    pub fn delay(&self) -> Duration {
        match self.max {
            Some(max) => self.current.min(max),
            None => self.current,
        }
    }

    pub fn advance(&mut self) {
        let last = self.current;
        self.current = self.current.saturating_add(self.next);
        self.next = last;
    }
}

/// Yields the successive delays.
impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.delay();
        self.advance();
        Some(delay)
    }
}
