//! sync::retry
//!
//! Bounded, time-boxed retry execution for remote calls.
//!
//! # Design
//!
//! Classification is narrow and typed: only
//! [`RemoteError::UnknownHostKey`](crate::remote::RemoteError::UnknownHostKey)
//! is retryable - the remote reports it while a certificate registration
//! race with repository registration has not yet settled. Every other
//! failure is terminal on its first occurrence.
//!
//! The retried operation must be safe to call back-to-back (idempotent
//! creation against an API that itself rejects duplicates), so no backoff
//! is needed for correctness; a small fixed delay between attempts avoids
//! busy-looping. When the wall-clock budget elapses with only retryable
//! failures observed, the last failure is handed back so the caller can
//! surface it inside a typed timeout error.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::remote::RemoteError;

/// Delay between attempts. Not a correctness requirement; it only keeps
/// the loop from hammering the remote.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of a bounded retry run.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The operation succeeded within the budget.
    Success(T),
    /// The budget elapsed; carries the last transient failure observed.
    RetryableFailure(RemoteError),
    /// The operation failed for a non-transient reason; not retried.
    TerminalFailure(RemoteError),
}

/// A wall-clock-bounded retry executor.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    budget: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given wall-clock budget.
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// The configured budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Invoke `operation` until it succeeds, fails terminally, or the
    /// budget elapses. The operation is always attempted at least once.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let deadline = Instant::now() + self.budget;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return RetryOutcome::Success(value),
                Err(err) if err.is_transient() => {
                    if Instant::now() >= deadline {
                        return RetryOutcome::RetryableFailure(err);
                    }
                    debug!(attempt, error = %err, "transient failure, retrying");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(err) => return RetryOutcome::TerminalFailure(err),
            }
        }
    }
}
