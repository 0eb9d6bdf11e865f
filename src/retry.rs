use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::io;
use std::thread;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failed attempt, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    fn delay(&self, failures: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How often a single positioned or sequential read is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            backoff: Backoff::Fixed(Duration::from_millis(10)),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Backoff) -> Self {
        RetryPolicy { attempts, backoff }
    }

    /// No retries, no sleeping.
    pub fn none() -> Self {
        RetryPolicy::new(1, Backoff::Fixed(Duration::ZERO))
    }

    /// Runs `op` until it succeeds or `attempts` are used up. `offset` only
    /// labels the error and log lines.
    pub fn run<T>(
        &self,
        cancel: &CancelToken,
        offset: u64,
        mut op: impl FnMut() -> io::Result<T>,
    ) -> Result<T> {
        let attempts = self.attempts.max(1);
        let mut failures = 0;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) => {
                    failures += 1;
                    if failures >= attempts {
                        return Err(Error::Read {
                            offset,
                            attempts,
                            source: e,
                        });
                    }
                    let delay = self.backoff.delay(failures);
                    warn!(offset, attempt = failures, ?delay, error = %e, "read failed, retrying");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    cancel.check()?;
                }
            }
        }
    }
}
