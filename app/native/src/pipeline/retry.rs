//! Bounded retry with a fixed delay between attempts.

use std::fmt::Display;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RetryConfig;

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::new(3, Duration::from_secs(60)) }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to 1 if zero.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_seconds))
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 { self.max_attempts }

    #[must_use]
    pub const fn delay(&self) -> Duration { self.delay }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) { std::thread::sleep(duration); }
}

/// Returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Delays requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> { self.sleeps.lock().clone() }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) { self.sleeps.lock().push(duration); }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// `op` receives the 1-based attempt number. The policy delay is slept only
/// between a failed attempt and the next one, never after the last.
///
/// # Errors
///
/// Returns `RetryExhausted` with the final error when no attempt succeeds.
pub fn retry<T, E, F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = policy.delay.as_secs_f64(),
                    "attempt failed, retrying"
                );
                sleeper.sleep(policy.delay);
                attempt += 1;
            }
            Err(err) => {
                tracing::warn!(error = %err, attempt, "final attempt failed");
                return Err(RetryExhausted { attempts: attempt, last: err });
            }
        }
    }
}
