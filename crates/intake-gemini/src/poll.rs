//! Bounded polling with backoff.
//!
//! Waits for an external state transition: check, sleep, check again, with
//! the interval growing by a fixed factor up to a cap, until the check
//! reports completion or the maximum wait elapses.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

const MIN_MULTIPLIER: f64 = 1.0;
const MAX_MULTIPLIER: f64 = 10.0;

/// Polling behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second check.
    pub interval: Duration,
    /// Upper bound for the delay between checks.
    pub max_interval: Duration,
    /// Factor applied to the delay after each check.
    pub multiplier: f64,
    /// Give up once this much time has passed since the first check.
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            multiplier: 1.5,
            max_wait: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no backoff.
    pub fn fixed(interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            max_wait,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Reject policies that would spin without sleeping or back off without bound.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("poll interval must be greater than zero".to_string());
        }
        if !(MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&self.multiplier) {
            return Err(format!(
                "poll backoff multiplier must be between {} and {}, got {}",
                MIN_MULTIPLIER, MAX_MULTIPLIER, self.multiplier
            ));
        }
        Ok(())
    }

    /// Delay to use after `current`.
    fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= MIN_MULTIPLIER {
            self.multiplier
        } else {
            MIN_MULTIPLIER
        };
        let cap = self.max_interval.max(self.interval);
        Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(cap)
            .min(cap)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check<T> {
    /// Still waiting.
    Pending,
    /// Transition observed.
    Done(T),
}

/// Why [`wait_for`] stopped without a result.
#[derive(Debug)]
pub enum WaitError<E> {
    /// The maximum wait elapsed while the check kept reporting pending.
    TimedOut { waited: Duration, attempts: u32 },
    /// The check itself failed.
    Failed(E),
}

/// Check until done, a check error, or the policy's maximum wait.
///
/// The check runs immediately, then after every sleep. A sleep never
/// overshoots the remaining wait, and one last check runs at the deadline.
pub async fn wait_for<F, Fut, T, E>(policy: &PollPolicy, check: F) -> Result<T, WaitError<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Check<T>, E>>,
{
    let start = Instant::now();
    let mut delay = policy.interval;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match check().await {
            Ok(Check::Done(value)) => return Ok(value),
            Ok(Check::Pending) => {}
            Err(e) => return Err(WaitError::Failed(e)),
        }

        let waited = start.elapsed();
        if waited >= policy.max_wait {
            return Err(WaitError::TimedOut { waited, attempts });
        }

        let sleep_for = delay.min(policy.max_wait - waited);
        debug!(attempt = attempts, delay_ms = sleep_for.as_millis() as u64, "Still pending");
        tokio::time::sleep(sleep_for).await;
        delay = policy.next_interval(delay);
    }
}
