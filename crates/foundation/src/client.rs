//! Service control client for one foundation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mysql_tools_core::{Backoff, Disposition, PollState, Sleeper};
use tracing::{debug, info, warn};

use crate::config::FoundationConfig;
use crate::error::{Error, Result};
use crate::key::{KeyKind, ReplicationKey};
use crate::runner::{CfCli, CfSession, CommandRunner};
use crate::status::{self, LastOperation, OperationState};
use crate::task::TaskClient;

/// Control-plane operations the replication workflows need from a
/// foundation.
#[async_trait]
pub trait ServiceControlClient: Send + Sync {
    /// Identifier of the foundation, used in log lines and errors.
    fn id(&self) -> &str;

    /// Succeed only if the instance exists.
    ///
    /// # Errors
    ///
    /// [`Error::InstanceNotFound`] when the control plane reports the
    /// instance missing, [`Error::InstanceLookupFailed`] when existence
    /// could not be determined.
    async fn instance_exists(&self, instance: &str) -> Result<()>;

    /// Plan name of the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be read or carries no plan.
    async fn instance_plan_name(&self, instance: &str) -> Result<String>;

    /// Succeed only if the marketplace offers `plan`.
    ///
    /// # Errors
    ///
    /// [`Error::PlanDoesNotExist`] when the plan is not listed, or a lookup
    /// error.
    async fn plan_exists(&self, plan: &str) -> Result<()>;

    /// Create and fetch a host-info key on the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be created, retrieved or parsed.
    async fn create_host_info_key(&self, instance: &str) -> Result<ReplicationKey>;

    /// Create and fetch a credentials key on the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be created, retrieved or parsed.
    async fn create_credentials_key(&self, instance: &str) -> Result<ReplicationKey>;

    /// Submit `update-service` with `params` (and `plan` if given) and
    /// block until the operation is no longer in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if submission fails, the operation fails, or status
    /// reads fail too many times in a row.
    async fn update_service_and_wait(
        &self,
        instance: &str,
        params: &str,
        plan: Option<&str>,
    ) -> Result<()>;
}

/// [`ServiceControlClient`] driving the cf CLI against one saved session.
#[derive(Clone)]
pub struct Foundation {
    id: String,
    home: PathBuf,
    offering: String,
    runner: Arc<dyn CommandRunner>,
    backoff: Backoff,
}

impl fmt::Debug for Foundation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foundation")
            .field("id", &self.id)
            .field("home", &self.home)
            .field("offering", &self.offering)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Foundation {
    /// Client running the configured cf executable with `CF_HOME=home`.
    pub fn new(id: impl Into<String>, home: impl Into<PathBuf>, config: &FoundationConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(CfCli::new(config.cli_path.clone()));
        Self::with_runner(id, home, config, runner)
    }

    /// Client running commands through `runner`.
    pub fn with_runner(
        id: impl Into<String>,
        home: impl Into<PathBuf>,
        config: &FoundationConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let home = home.into();
        let session = Arc::new(CfSession::new(runner.clone(), home.clone()));
        Self {
            id: id.into(),
            offering: config.offering.clone(),
            backoff: config.backoff().with_session_refresher(session),
            home,
            runner,
        }
    }

    /// Replace the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.backoff = self.backoff.with_sleeper(sleeper);
        self
    }

    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Task client sharing this foundation's session and backoff.
    #[must_use]
    pub fn task_client(&self) -> TaskClient {
        TaskClient::new(self.runner.clone(), self.home.clone(), self.backoff.clone())
    }

    async fn cf(&self, args: &[&str]) -> mysql_tools_core::Result<String> {
        self.runner.run(&self.home, args).await
    }

    /// `cf service <instance>`, retried unless the instance is reported
    /// missing.
    async fn service_status(&self, instance: &str) -> mysql_tools_core::Result<String> {
        let not_found = status::not_found_message(instance);
        self.backoff
            .retry(
                &format!("look up status of service instance '{instance}'"),
                |e: &mysql_tools_core::Error| {
                    if e.mentions(&not_found) {
                        Disposition::Abort
                    } else {
                        Disposition::Retry
                    }
                },
                move || async move { self.cf(&["service", instance]).await },
            )
            .await
    }

    async fn create_key(&self, instance: &str, kind: KeyKind) -> Result<ReplicationKey> {
        let key_name = kind.key_name(Utc::now().timestamp());
        let params = kind.request_params();
        debug!(foundation = %self.id, instance, key = %key_name, "Creating service key");

        self.cf(&["create-service-key", instance, &key_name, "-c", &params])
            .await
            .map_err(|source| Error::ServiceKeyCreateFailed { source })?;

        let output = self
            .cf(&["service-key", instance, &key_name])
            .await
            .map_err(|source| Error::ServiceKeyRetrieveFailed {
                key_name: key_name.clone(),
                instance: instance.to_string(),
                source,
            })?;

        ReplicationKey::extract(kind, &output)
    }
}

#[async_trait]
impl ServiceControlClient for Foundation {
    fn id(&self) -> &str {
        &self.id
    }

    async fn instance_exists(&self, instance: &str) -> Result<()> {
        let not_found = status::not_found_message(instance);
        match self.service_status(instance).await {
            Ok(output) if output.contains(&not_found) => Err(Error::instance_not_found(instance)),
            Ok(_) => Ok(()),
            Err(e) if e.mentions(&not_found) => Err(Error::instance_not_found(instance)),
            Err(source) => Err(Error::InstanceLookupFailed { source }),
        }
    }

    async fn instance_plan_name(&self, instance: &str) -> Result<String> {
        let output = self
            .service_status(instance)
            .await
            .map_err(|e| Error::plan_lookup_failed(instance, e))?;
        status::plan_name(&output).ok_or_else(|| Error::plan_not_found(instance))
    }

    async fn plan_exists(&self, plan: &str) -> Result<()> {
        let offering = self.offering.as_str();
        let listing = self
            .backoff
            .retry_transient::<_, mysql_tools_core::Error, _, _>(
                &format!("list plans of offering '{offering}'"),
                move || async move { self.cf(&["marketplace", "-e", offering]).await },
            )
            .await?;

        let listed = listing
            .lines()
            .any(|line| line.split_whitespace().next() == Some(plan));
        if listed {
            Ok(())
        } else {
            Err(Error::plan_does_not_exist(&self.id, plan))
        }
    }

    async fn create_host_info_key(&self, instance: &str) -> Result<ReplicationKey> {
        self.create_key(instance, KeyKind::HostInfo).await
    }

    async fn create_credentials_key(&self, instance: &str) -> Result<ReplicationKey> {
        self.create_key(instance, KeyKind::Credentials).await
    }

    async fn update_service_and_wait(
        &self,
        instance: &str,
        params: &str,
        plan: Option<&str>,
    ) -> Result<()> {
        let mut args = vec!["update-service", instance, "-c", params];
        if let Some(plan) = plan {
            args.extend(["-p", plan]);
        }
        self.cf(&args).await?;
        info!(foundation = %self.id, instance, "Update submitted, waiting for completion");

        let last = self
            .backoff
            .poll_until::<_, mysql_tools_core::Error, _, _>(
                &format!("look up status of service instance '{instance}'"),
                move || async move {
                    let output = self.cf(&["service", instance]).await?;
                    let last = LastOperation::from_service_output(&output);
                    if last.state.is_in_progress() {
                        Ok(PollState::Pending)
                    } else {
                        Ok(PollState::Ready(last))
                    }
                },
            )
            .await?;

        match last.state {
            OperationState::Failed => Err(Error::operation_failed(
                "update service",
                instance,
                last.description,
            )),
            OperationState::Other(state) => {
                warn!(
                    foundation = %self.id,
                    instance,
                    state = %state,
                    "Unrecognized last operation state, treating as success"
                );
                Ok(())
            }
            OperationState::Succeeded | OperationState::InProgress => Ok(()),
        }
    }
}
