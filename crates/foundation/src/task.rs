//! One-off tasks run through the cloud controller v3 API.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use mysql_tools_core::{Backoff, SESSION_EXPIRED_MARKER};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::runner::CommandRunner;

/// Lifecycle state of a task. Only `SUCCEEDED` and `FAILED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Succeeded,
    Failed,
    #[default]
    #[serde(other)]
    Running,
}

impl TaskState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Error entry of a cloud controller response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

impl Task {
    fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|_| {
            mysql_tools_core::Error::invalid_response(format!(
                "failed to parse the following api response: {raw}"
            ))
            .into()
        })
    }
}

/// Runs tasks on apps of one foundation.
#[derive(Clone)]
pub struct TaskClient {
    runner: Arc<dyn CommandRunner>,
    home: PathBuf,
    backoff: Backoff,
}

impl fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskClient")
            .field("home", &self.home)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl TaskClient {
    pub fn new(runner: Arc<dyn CommandRunner>, home: impl Into<PathBuf>, backoff: Backoff) -> Self {
        Self {
            runner,
            home: home.into(),
            backoff,
        }
    }

    /// GUID of the app named `app` in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns an error if the app cannot be found.
    pub async fn app_guid(&self, app: &str) -> Result<String> {
        let output = self
            .runner
            .run(&self.home, &["app", app, "--guid"])
            .await
            .map_err(|e| Error::AppLookupFailed {
                reason: e.to_string(),
            })?;

        output
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::AppLookupFailed {
                reason: format!("no guid reported for app '{app}'"),
            })
    }

    /// Start `command` as a task on the app.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn create_task(&self, app_guid: &str, command: &str) -> Result<Task> {
        let body = serde_json::json!({ "command": command }).to_string();
        let path = format!("/v3/apps/{app_guid}/tasks");
        let output = self
            .runner
            .run(&self.home, &["curl", "-X", "POST", "-d", &body, &path])
            .await
            .map_err(|e| Error::TaskCreateFailed {
                reason: e.to_string(),
            })?;

        let task = Task::parse(&output)?;
        if let Some(err) = task.errors.first() {
            return Err(Error::TaskCreateFailed {
                reason: format!("{}: {} - {}", err.code, err.title, err.detail),
            });
        }
        Ok(task)
    }

    /// Current view of a task, retried with backoff.
    ///
    /// # Errors
    ///
    /// Returns `failed to retrieve task by GUID` once every attempt failed.
    pub async fn task_by_guid(&self, guid: &str) -> Result<Task> {
        self.backoff
            .retry_transient("retrieve task by GUID", move || async move {
                self.request_task(guid).await
            })
            .await
    }

    async fn request_task(&self, guid: &str) -> Result<Task> {
        let path = format!("/v3/tasks/{guid}");
        let output = self.runner.run(&self.home, &["curl", &path]).await?;

        let task = Task::parse(&output)?;
        match task.errors.first() {
            Some(err) if err.title == SESSION_EXPIRED_MARKER => {
                Err(mysql_tools_core::Error::invalid_response(format!(
                    "(error code 1000: {SESSION_EXPIRED_MARKER} - Invalid Auth Token)"
                ))
                .into())
            }
            Some(err) => Err(Error::Api {
                code: err.code,
                title: err.title.clone(),
                detail: err.detail.clone(),
            }),
            None => Ok(task),
        }
    }

    /// Run `command` on `app` and wait until the task is terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot be started or tracked, or if it
    /// ends `FAILED`.
    pub async fn run_task(&self, app: &str, command: &str) -> Result<Task> {
        let app_guid = self.app_guid(app).await?;
        let mut task = self.create_task(&app_guid, command).await?;
        info!(app, task = %task.guid, "Task started");

        while !task.state.is_terminal() {
            self.backoff.pause(self.backoff.poll_interval()).await;
            task = self.task_by_guid(&task.guid).await?;
            debug!(task = %task.guid, state = %task.state, "Task state");
        }

        if task.state == TaskState::Failed {
            return Err(Error::TaskFailed { state: task.state });
        }
        Ok(task)
    }
}
