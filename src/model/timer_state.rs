use std::time::{Duration, Instant};

/// Elapsed-time accumulator for one playthrough.
///
/// Time is measured on a monotonic clock. `accumulated` holds the total of every
/// finished running segment; `running_since` marks the start of the current one.
/// Pausing folds the open segment into `accumulated`, resuming opens a new one, so
/// any number of pause/resume cycles neither drops nor double-counts time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerState {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Restarts from zero.
    pub fn start(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(now);
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated = self
                .accumulated
                .saturating_add(now.saturating_duration_since(since));
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Freezes the final value. Same as a pause; kept separate for readability at call sites.
    pub fn stop(&mut self, now: Instant) {
        self.pause(now);
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self
                .accumulated
                .saturating_add(now.saturating_duration_since(since)),
            None => self.accumulated,
        }
    }
}
