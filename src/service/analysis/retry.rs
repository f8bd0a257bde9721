use std::time::Duration;

use crate::shared::config::PollConfig;

/// Bounded polling schedule for one job.
///
/// The delay before status check `n` (1-based) is
/// `poll_interval * backoff_multiplier^(n-1)`, capped at `max_interval`
/// (never below `poll_interval`). A multiplier of `1.0` gives a fixed interval.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub backoff_multiplier: f64,
    pub max_interval: Duration,
}

impl RetryPolicy {
    pub fn fixed(poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            poll_interval,
            max_attempts,
            backoff_multiplier: 1.0,
            max_interval: poll_interval,
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.backoff_multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
            multiplier
        } else {
            1.0
        };
        self.max_interval = max_interval;
        self
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let cap = self.max_interval.max(self.poll_interval);
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.poll_interval.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= cap.as_secs_f64() {
            return cap;
        }
        Duration::from_secs_f64(secs)
    }

    /// Total time spent waiting if every attempt is used.
    pub fn budget(&self) -> Duration {
        let cap = self.max_interval.max(self.poll_interval);
        let mut total = Duration::ZERO;
        for attempt in 1..=self.max_attempts {
            let delay = self.delay_for(attempt);
            if delay == cap {
                let remaining = self.max_attempts - attempt + 1;
                return total.saturating_add(cap.saturating_mul(remaining));
            }
            total = total.saturating_add(delay);
        }
        total
    }
}

impl From<&PollConfig> for RetryPolicy {
    fn from(cfg: &PollConfig) -> Self {
        RetryPolicy::fixed(cfg.interval, cfg.max_attempts)
            .with_backoff(cfg.backoff_multiplier, cfg.max_interval)
    }
}
