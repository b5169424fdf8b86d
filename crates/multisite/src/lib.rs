#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # mysql-tools-multisite
//!
//! Replication workflows spanning two foundations, and the store of saved
//! foundation targets they run against.
//!
//! ```ignore
//! let workflow = Workflow::new(primary_site, secondary_site, Arc::new(TracingLogger));
//! workflow.setup_replication("db0", "db1").await?;
//! ```

pub mod error;
pub mod logger;
mod setup;
mod switchover;
pub mod targets;
pub mod workflow;

pub use error::{Error, Result};
pub use logger::{Logger, TracingLogger};
pub use targets::{Target, TargetStore};
pub use workflow::{MAKE_LEADER_READ_ONLY, PROMOTE_FOLLOWER_TO_LEADER, Workflow};
