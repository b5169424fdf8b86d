//! Invocation of the cf CLI against one foundation's saved session.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_tools_core::{Error, Result, SessionRefresher};
use tokio::process::Command;
use tracing::debug;

/// Runs one cf command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `cf <args>` with `CF_HOME` set to `home`.
    ///
    /// Returns the combined, trimmed stdout and stderr. On a non-zero exit
    /// the same output travels inside [`Error::CommandFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    async fn run(&self, home: &Path, args: &[&str]) -> Result<String>;
}

/// [`CommandRunner`] backed by a real cf executable.
#[derive(Debug, Clone)]
pub struct CfCli {
    cli_path: String,
}

impl CfCli {
    pub fn new(cli_path: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for CfCli {
    async fn run(&self, home: &Path, args: &[&str]) -> Result<String> {
        let command = args.first().copied().unwrap_or_default();
        debug!(cli = %self.cli_path, cf_home = %home.display(), command, "Running cf CLI");

        let output = Command::new(&self.cli_path)
            .args(args)
            .env("CF_HOME", home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::command_spawn_failed(command, e.to_string()))?
            .wait_with_output()
            .await
            .map_err(|e| Error::command_spawn_failed(command, e.to_string()))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_string();

        if !output.status.success() {
            return Err(Error::command_failed(command, output.status.to_string(), combined));
        }
        Ok(combined)
    }
}

/// Refreshes the access token of one foundation via `cf oauth-token`.
#[derive(Clone)]
pub struct CfSession {
    runner: Arc<dyn CommandRunner>,
    home: PathBuf,
}

impl CfSession {
    pub fn new(runner: Arc<dyn CommandRunner>, home: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            home: home.into(),
        }
    }
}

#[async_trait]
impl SessionRefresher for CfSession {
    async fn refresh_session(&self) -> Result<()> {
        debug!(cf_home = %self.home.display(), "Refreshing access token");
        self.runner.run(&self.home, &["oauth-token"]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testing::ScriptedRunner;

    #[tokio::test]
    async fn test_session_refresh_runs_oauth_token_in_home() {
        let runner = Arc::new(ScriptedRunner::new(|_| Ok("bearer abc".to_string())));
        let session = CfSession::new(runner.clone(), "/tmp/foundation-a");

        session.refresh_session().await.unwrap();

        assert_eq!(runner.calls(), vec![vec!["oauth-token".to_string()]]);
        assert_eq!(runner.homes(), vec![PathBuf::from("/tmp/foundation-a")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cli_reports_exit_status_with_output() {
        let cli = CfCli::new("sh");
        let err = cli
            .run(Path::new("/tmp"), &["-c", "echo \"Service instance 'db0' not found\"; exit 1"])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(err.output(), Some("Service instance 'db0' not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cli_passes_cf_home() {
        let cli = CfCli::new("sh");
        let out = cli
            .run(Path::new("/tmp/foundation-b"), &["-c", "printf '%s\\n' \"$CF_HOME\""])
            .await
            .unwrap();

        assert_eq!(out, "/tmp/foundation-b");
    }

    #[tokio::test]
    async fn test_cli_missing_executable_is_spawn_error() {
        let cli = CfCli::new("/nonexistent/cf-binary");
        let err = cli.run(Path::new("/tmp"), &["service", "db0"]).await.unwrap_err();
        assert!(matches!(err, Error::CommandSpawnFailed { .. }));
    }
}
