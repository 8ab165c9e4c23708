use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Global wall-clock spacing between provider calls.
///
/// Independent of simulation time. A denied call is skipped, never queued.
#[derive(Debug)]
pub struct CallBudget {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl CallBudget {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn can_call(&self, now: Instant) -> bool {
        let last = *self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        Self::elapsed_enough(last, now, self.min_interval)
    }

    /// Check and record in one step. Returns false when the call must be skipped.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut last = self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        if !Self::elapsed_enough(*last, now, self.min_interval) {
            tracing::debug!(
                min_interval_secs = self.min_interval.as_secs(),
                "rate limited, skipping call"
            );
            return false;
        }
        *last = Some(now);
        true
    }

    pub fn record_call(&self, now: Instant) {
        *self.last_call.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
    }

    fn elapsed_enough(last: Option<Instant>, now: Instant, min: Duration) -> bool {
        match last {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= min,
        }
    }
}
