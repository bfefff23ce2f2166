//! Generic retry policy for external port calls.
//!
//! Replaces the per-call-site sleep loop of the original with one policy
//! applied uniformly: only `TransientExternal` failures are re-attempted,
//! with `base * 2^attempt` backoff and no overall timeout.
use crate::error::{Result, ScribeError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so `max_retries = 3` means up to
    /// four calls in total.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying transient failures until the budget is spent.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(ScribeError::TransientExternal(message)) if attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "transient failure, backing off"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
