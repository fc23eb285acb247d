//! Push debouncing.
//!
//! Every local change reschedules a single pending push; the push fires once
//! the quiet window has elapsed since the most recent change.

use chrono::{DateTime, Duration, Utc};

/// A single cancellable deadline over an injected clock.
#[derive(Debug, Clone)]
pub struct PushDebouncer {
    window: Duration,
    debounce_until: Option<DateTime<Utc>>,
}

impl PushDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(Duration::zero()),
            debounce_until: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace any pending deadline with `now + window`.
    pub fn schedule(&mut self, now: DateTime<Utc>) {
        self.debounce_until = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.debounce_until = None;
    }

    pub fn is_pending(&self) -> bool {
        self.debounce_until.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.debounce_until.is_some_and(|t| t <= now)
    }

    /// Consume the deadline if it has passed. Returns true at most once per
    /// schedule.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_due(now) {
            self.debounce_until = None;
            true
        } else {
            false
        }
    }

    /// Time until the pending push fires, zero if overdue.
    pub fn time_until_due(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.debounce_until.map(|t| {
            if t > now {
                t - now
            } else {
                Duration::zero()
            }
        })
    }
}
