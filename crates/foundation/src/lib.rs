#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # mysql-tools-foundation
//!
//! Control-plane client for one Cloud Foundry foundation. Every operation
//! shells out to the cf CLI with `CF_HOME` pointing at that foundation's
//! saved session, so two foundations can be driven from one process.
//!
//! ## Example
//!
//! ```ignore
//! use mysql_tools_foundation::{Foundation, FoundationConfig, ServiceControlClient};
//!
//! let config = FoundationConfig::from_env()?;
//! let primary = Foundation::new("primary-site", "/home/me/.cf/.mysql-tools/primary-site", &config);
//! primary.instance_exists("db0").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod runner;
pub mod status;
pub mod task;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{Foundation, ServiceControlClient};
pub use config::{DEFAULT_OFFERING, FoundationConfig};
pub use error::{Error, Result};
pub use key::{KeyKind, ReplicationKey};
pub use runner::{CfCli, CfSession, CommandRunner};
pub use status::{LastOperation, OperationState};
pub use task::{ApiError, Task, TaskClient, TaskState};
