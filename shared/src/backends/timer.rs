use std::time::Duration;

use super::Instant;

/// Enters a "ringing" state once its duration has passed without a reset.
/// Driven entirely by the `now` passed in.
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    /// Creates a new Timer with a given Duration, started at `now`
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    /// Reset the Timer to stop ringing and wait till 'Duration' has elapsed
    /// again
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Gets whether or not the Timer is "Ringing" (i.e. the given Duration has
    /// elapsed since the last "reset")
    pub fn ringing(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) > self.duration
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
