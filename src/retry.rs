// src/retry.rs

//! Bounded retry with a fixed delay.
//!
//! The operation is called once, then up to `max_retries` more times with
//! `delay` between attempts. When the last attempt fails the failure is
//! written to the [`ErrorLog`] and returned as
//! [`LanekeeperError::RetriesExhausted`]; callers treat that as a reported,
//! non-fatal outcome.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error_log::ErrorLog;
use crate::errors::{LanekeeperError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Run `op` under `policy`.
///
/// `context` names the call site in logs and in the error record.
pub async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    errors: &ErrorLog,
    context: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut remaining = policy.max_retries;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match op().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(context, attempts, "operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) if remaining > 0 => {
                warn!(
                    context,
                    attempt = attempts,
                    remaining,
                    error = %err,
                    "operation failed; retrying after delay"
                );
                remaining -= 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => {
                let message = err.to_string();
                errors.record(
                    context,
                    format!("gave up after {attempts} attempts: {message}"),
                );
                return Err(LanekeeperError::RetriesExhausted {
                    context: context.to_string(),
                    attempts,
                    message,
                });
            }
        }
    }
}
