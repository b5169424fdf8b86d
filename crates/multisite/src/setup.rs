use mysql_tools_foundation::Result;

use crate::workflow::Workflow;

impl Workflow {
    /// Make `secondary` a follower of `primary`.
    ///
    /// The secondary's host info is registered on the primary, then the
    /// primary's replication credentials are registered on the secondary.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error unchanged.
    pub async fn setup_replication(&self, primary: &str, secondary: &str) -> Result<()> {
        let (site1, site2) = (&self.primary_site, &self.secondary_site);

        self.logger.log(format_args!(
            "[{}] Checking whether instance '{primary}' exists",
            site1.id()
        ));
        site1.instance_exists(primary).await?;

        self.logger.log(format_args!(
            "[{}] Checking whether instance '{secondary}' exists",
            site2.id()
        ));
        site2.instance_exists(secondary).await?;

        self.logger.log(format_args!(
            "[{}] Retrieving information for secondary instance '{secondary}'",
            site2.id()
        ));
        let host_info = site2.create_host_info_key(secondary).await?;

        self.logger.log(format_args!(
            "[{}] Registering secondary instance information on primary instance '{primary}'",
            site1.id()
        ));
        site1
            .update_service_and_wait(primary, host_info.as_str(), None)
            .await?;

        self.logger.log(format_args!(
            "[{}] Retrieving replication configuration from primary instance '{primary}'",
            site1.id()
        ));
        let credentials = site1.create_credentials_key(primary).await?;

        self.logger.log(format_args!(
            "[{}] Updating secondary instance '{secondary}' with replication configuration",
            site2.id()
        ));
        site2
            .update_service_and_wait(secondary, credentials.as_str(), None)
            .await?;

        self.logger
            .log(format_args!("Successfully configured replication"));
        Ok(())
    }
}
