#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # mysql-tools-core
//!
//! Errors and the retry/backoff primitives every control-plane interaction is
//! built on.
//!
//! ## Example
//!
//! ```ignore
//! use mysql_tools_core::{Backoff, Disposition};
//!
//! let backoff = Backoff::new().with_max_attempts(3);
//! let status = backoff
//!     .retry_transient("look up status of service instance 'db0'", || read_status("db0"))
//!     .await?;
//! ```

pub mod error;
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use retry::{
    Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, Disposition, PollState,
    SESSION_EXPIRED_MARKER, SessionRefresher, Sleeper, TokioSleeper, is_session_expired,
};
