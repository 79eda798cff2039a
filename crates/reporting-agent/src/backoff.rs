//! Consecutive-failure backoff for the reporting loop.

use std::time::Duration;

/// Upper bound on any wait between report attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Exponential wait derived from the sampling interval.
///
/// With no failures the wait is the interval itself. After `n` consecutive
/// failures it is `interval * 2^n`, capped at [`MAX_BACKOFF`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use reporting_agent::Backoff;
///
/// let mut backoff = Backoff::new(Duration::from_secs(3));
/// backoff.record_failure();
/// backoff.record_failure();
/// assert_eq!(backoff.delay(), Duration::from_secs(12));
/// backoff.record_success();
/// assert_eq!(backoff.delay(), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    interval: Duration,
    failures: u32,
}

impl Backoff {
    /// Start with no recorded failures.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            failures: 0,
        }
    }

    /// Consecutive failures since the last success.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Reset after a successful cycle.
    pub const fn record_success(&mut self) {
        self.failures = 0;
    }

    /// Count another failed cycle.
    pub const fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    /// Wait before the next attempt.
    #[must_use]
    pub fn delay(&self) -> Duration {
        let scaled = 2_u32
            .checked_pow(self.failures)
            .and_then(|factor| self.interval.checked_mul(factor))
            .unwrap_or(MAX_BACKOFF);
        scaled.min(MAX_BACKOFF)
    }
}
