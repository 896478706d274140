//! # Retry Policy
//!
//! Bounded exponential backoff for remote calls, with an injectable sleep.
//!
//! ## Schedule (defaults)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  attempt 1 ──fail──► sleep 2s ──► attempt 2 ──fail──► sleep 4s ──►     │
//! │  attempt 3 ──fail──► RetryExhausted { attempts: 3, last_error }        │
//! │                                                                         │
//! │  Any success short-circuits the schedule.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The delay schedule comes from `backoff::ExponentialBackoff` with zero
//! randomization, so it is deterministic and can be asserted in tests.
//! Sleeping goes through [`Sleeper`] so tests never wait for real.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use thiserror::Error;
use tracing::warn;

use medi_core::DEFAULT_MAX_ATTEMPTS;

use crate::error::{RemoteError, RemoteResult};

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

// =============================================================================
// Sleeper
// =============================================================================

/// Suspends the current task; the only source of time in the orchestrator.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// All attempts failed.
#[derive(Debug, Clone, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: RemoteError,
}

/// Max attempts plus an exponential delay schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            initial_delay,
            ..Default::default()
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_delay,
            initial_interval: self.initial_delay,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: MAX_BACKOFF,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// The delays slept between attempts, in order (`max_attempts - 1` of them).
    pub fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.create_backoff();
        (1..self.max_attempts)
            .filter_map(|_| backoff.next_backoff())
            .collect()
    }

    /// Runs `operation` until it succeeds or the attempts are used up.
    ///
    /// The operation is called with the 1-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let last_error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error,
                });
            }

            let delay = backoff.next_backoff().unwrap_or(MAX_BACKOFF);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                retryable = last_error.is_retryable(),
                error = %last_error,
                "Remote call failed, backing off"
            );
            sleeper.sleep(delay).await;
        }
    }
}
