//! Two-foundation replication workflows.
//!
//! A [`Workflow`] pairs the foundation hosting the current primary instance
//! with the foundation hosting the secondary. Steps run strictly one after
//! another and the first error is returned as-is. Nothing is rolled back.

use std::fmt;
use std::sync::Arc;

use mysql_tools_foundation::ServiceControlClient;

use crate::logger::Logger;

/// Update parameters that make the leader read-only.
pub const MAKE_LEADER_READ_ONLY: &str = r#"{"initiate-failover":"make-leader-read-only"}"#;

/// Update parameters that promote the follower to leader.
pub const PROMOTE_FOLLOWER_TO_LEADER: &str = r#"{"initiate-failover":"promote-follower-to-leader"}"#;

#[derive(Clone)]
pub struct Workflow {
    pub(crate) primary_site: Arc<dyn ServiceControlClient>,
    pub(crate) secondary_site: Arc<dyn ServiceControlClient>,
    pub(crate) logger: Arc<dyn Logger>,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("primary_site", &self.primary_site.id())
            .field("secondary_site", &self.secondary_site.id())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// `primary_site` hosts the current primary instance,
    /// `secondary_site` the current secondary.
    pub fn new(
        primary_site: Arc<dyn ServiceControlClient>,
        secondary_site: Arc<dyn ServiceControlClient>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            primary_site,
            secondary_site,
            logger,
        }
    }
}
