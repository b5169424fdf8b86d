use mysql_tools_foundation::Result;

use crate::workflow::{MAKE_LEADER_READ_ONLY, PROMOTE_FOLLOWER_TO_LEADER, Workflow};

impl Workflow {
    /// Swap roles: `primary` becomes the follower of `secondary`.
    ///
    /// Before anything is mutated, each instance must exist and its plan
    /// must be offered on the other foundation, since each side takes on the
    /// other's plan during the swap. Replication is then re-established in
    /// the reverse direction.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error unchanged.
    pub async fn switchover_replication(&self, primary: &str, secondary: &str) -> Result<()> {
        let (site1, site2) = (&self.primary_site, &self.secondary_site);

        self.logger.log(format_args!(
            "[{}] Checking whether instance '{primary}' exists",
            site1.id()
        ));
        site1.instance_exists(primary).await?;

        self.logger.log(format_args!(
            "[{}] Retrieving plan of instance '{primary}'",
            site1.id()
        ));
        let primary_plan = site1.instance_plan_name(primary).await?;

        self.logger.log(format_args!(
            "[{}] Checking whether plan '{primary_plan}' exists",
            site2.id()
        ));
        site2.plan_exists(&primary_plan).await?;

        self.logger.log(format_args!(
            "[{}] Checking whether instance '{secondary}' exists",
            site2.id()
        ));
        site2.instance_exists(secondary).await?;

        self.logger.log(format_args!(
            "[{}] Retrieving plan of instance '{secondary}'",
            site2.id()
        ));
        let secondary_plan = site2.instance_plan_name(secondary).await?;

        self.logger.log(format_args!(
            "[{}] Checking whether plan '{secondary_plan}' exists",
            site1.id()
        ));
        site1.plan_exists(&secondary_plan).await?;

        self.logger.log(format_args!(
            "[{}] Demoting primary instance '{primary}'",
            site1.id()
        ));
        site1
            .update_service_and_wait(primary, MAKE_LEADER_READ_ONLY, Some(&secondary_plan))
            .await?;

        self.logger.log(format_args!(
            "[{}] Promoting secondary instance '{secondary}'",
            site2.id()
        ));
        site2
            .update_service_and_wait(secondary, PROMOTE_FOLLOWER_TO_LEADER, Some(&primary_plan))
            .await?;

        self.logger.log(format_args!(
            "[{}] Retrieving information for new secondary instance '{primary}'",
            site1.id()
        ));
        let host_info = site1.create_host_info_key(primary).await?;

        self.logger.log(format_args!(
            "[{}] Registering secondary instance information on new primary instance '{secondary}'",
            site2.id()
        ));
        site2
            .update_service_and_wait(secondary, host_info.as_str(), None)
            .await?;

        self.logger.log(format_args!(
            "[{}] Retrieving replication configuration from new primary instance '{secondary}'",
            site2.id()
        ));
        let credentials = site2.create_credentials_key(secondary).await?;

        self.logger.log(format_args!(
            "[{}] Updating new secondary instance '{primary}' with replication configuration",
            site1.id()
        ));
        site1
            .update_service_and_wait(primary, credentials.as_str(), None)
            .await?;

        self.logger.log(format_args!(
            "Successfully switched replication roles. primary = [{}] {secondary}, secondary = [{}] {primary}",
            site2.id(),
            site1.id()
        ));
        Ok(())
    }
}
