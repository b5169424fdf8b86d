//! Recording fakes for the retry primitives.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::retry::{SessionRefresher, Sleeper};

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Delays requested so far, in order.
    #[must_use]
    pub fn durations(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Session refresher that counts invocations.
#[derive(Debug, Default)]
pub struct RecordingRefresher {
    calls: Mutex<u32>,
    fail: bool,
}

impl RecordingRefresher {
    /// A refresher whose every refresh fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(0),
            fail: true,
        }
    }

    #[must_use]
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionRefresher for RecordingRefresher {
    async fn refresh_session(&self) -> Result<()> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls = calls.saturating_add(1);
        }
        if self.fail {
            return Err(Error::command_failed("oauth-token", "exit status: 1", "not logged in"));
        }
        Ok(())
    }
}
