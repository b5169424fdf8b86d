//! Retry logic with exponential backoff.
//!
//! Two loops are provided, both driven by a [`Backoff`] policy:
//!
//! - [`Backoff::retry`]: bounded-attempt retry for point-in-time reads.
//!   Before retry `i` (i >= 1) it sleeps `base << i`; the first attempt never
//!   sleeps.
//! - [`Backoff::poll_until`]: unbounded polling for asynchronous operations.
//!   A pending read keeps polling forever; only consecutive read failures
//!   consume the attempt budget.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can record the
//! schedule instead of waiting on the wall clock.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default attempt budget per client.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; retry `i` sleeps `DEFAULT_BASE_DELAY << i`.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Error title the control plane reports when the session token expired.
pub const SESSION_EXPIRED_MARKER: &str = "CF-InvalidAuthToken";

/// Check whether an error message indicates an expired session.
#[must_use]
pub fn is_session_expired(message: &str) -> bool {
    message.contains(SESSION_EXPIRED_MARKER)
}

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Refreshes an expired control-plane session.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Refresh the session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh command fails. Callers log it and keep
    /// retrying.
    async fn refresh_session(&self) -> Result<()>;
}

/// What a retry loop should do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient failure, spend another attempt.
    Retry,
    /// Terminal failure, return the error as-is.
    Abort,
}

/// Result of one read inside [`Backoff::poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    /// The operation has not reached a terminal state yet.
    Pending,
    /// The operation is terminal.
    Ready(T),
}

/// Exponential backoff policy with a fixed attempt budget.
#[derive(Clone)]
pub struct Backoff {
    max_attempts: u32,
    base_delay: Duration,
    poll_interval: Duration,
    sleeper: Arc<dyn Sleeper>,
    session: Option<Arc<dyn SessionRefresher>>,
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("poll_interval", &self.poll_interval)
            .field("refreshes_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            poll_interval: DEFAULT_BASE_DELAY,
            sleeper: Arc::new(TokioSleeper),
            session: None,
        }
    }
}

impl Backoff {
    /// Create a policy with the default budget and wall-clock sleeping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base delay.
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the pause between reads that report a pending operation.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Install a session refresher, invoked when a failure looks like an
    /// expired session.
    #[must_use]
    pub fn with_session_refresher(mut self, session: Arc<dyn SessionRefresher>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Delay before retry `retry` (1-based). Retry 0 is the first attempt
    /// and never waits.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sleep through the configured sleeper.
    pub async fn pause(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }

    /// Run `attempt` up to `max_attempts` times.
    ///
    /// `classify` decides whether a failure is worth another attempt. After
    /// the budget is spent the caller gets a single
    /// [`Error::RetriesExhausted`] naming `operation`; the underlying
    /// failures are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns the first error classified [`Disposition::Abort`], or a
    /// retries-exhausted error once every attempt failed.
    pub async fn retry<T, E, F, Fut, C>(
        &self,
        operation: &str,
        classify: C,
        mut attempt: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        C: Fn(&E) -> Disposition,
        E: From<Error> + fmt::Display,
    {
        let mut made = 0u32;
        while made < self.max_attempts {
            if made > 0 {
                let delay = self.delay_for(made);
                debug!(attempt = made, delay_ms = ?delay.as_millis(), "Retrying after delay");
                self.pause(delay).await;
            }
            made = made.saturating_add(1);

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if classify(&e) == Disposition::Abort => return Err(e),
                Err(e) => self.record_failure(operation, made, &e.to_string()).await,
            }
        }

        Err(Error::retries_exhausted(operation, made).into())
    }

    /// [`Backoff::retry`] treating every failure as transient.
    ///
    /// # Errors
    ///
    /// Returns a retries-exhausted error once every attempt failed.
    pub async fn retry_transient<T, E, F, Fut>(
        &self,
        operation: &str,
        attempt: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<Error> + fmt::Display,
    {
        self.retry(operation, |_| Disposition::Retry, attempt).await
    }

    /// Poll `read` until it reports a terminal state.
    ///
    /// A [`PollState::Pending`] read is not a failure: the loop waits
    /// `poll_interval` and reads again, without limit. A failed read counts
    /// against the attempt budget and is followed by the usual backoff
    /// delay; any successful read resets the count.
    ///
    /// # Errors
    ///
    /// Returns a retries-exhausted error naming `operation` after
    /// `max_attempts` consecutive read failures.
    pub async fn poll_until<T, E, F, Fut>(
        &self,
        operation: &str,
        mut read: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<PollState<T>, E>>,
        E: From<Error> + fmt::Display,
    {
        let mut failures = 0u32;
        loop {
            match read().await {
                Ok(PollState::Ready(value)) => return Ok(value),
                Ok(PollState::Pending) => {
                    failures = 0;
                    self.pause(self.poll_interval).await;
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    self.record_failure(operation, failures, &e.to_string()).await;
                    if failures >= self.max_attempts {
                        return Err(Error::retries_exhausted(operation, failures).into());
                    }
                    self.pause(self.delay_for(failures)).await;
                }
            }
        }
    }

    async fn record_failure(&self, operation: &str, attempt: u32, message: &str) {
        if is_session_expired(message) {
            if let Some(session) = &self.session {
                if let Err(e) = session.refresh_session().await {
                    warn!(error = %e, "failed to refresh the access token");
                }
            }
        }
        warn!(
            attempt,
            max_attempts = self.max_attempts,
            error = %message,
            "Attempt {}/{}: failed to {}",
            attempt,
            self.max_attempts,
            operation
        );
    }
}
