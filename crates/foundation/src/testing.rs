//! Scripted command runner for tests.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use mysql_tools_core::{Error, Result};

use crate::runner::CommandRunner;

type Handler = Box<dyn Fn(&[&str]) -> Result<String> + Send + Sync>;

/// [`CommandRunner`] that answers every invocation through a closure and
/// records what was run.
pub struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new(handler: impl Fn(&[&str]) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Arguments of every invocation, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().iter().map(|(_, args)| args.clone()).collect()
    }

    /// `CF_HOME` of every invocation, in order.
    #[must_use]
    pub fn homes(&self) -> Vec<PathBuf> {
        self.lock().iter().map(|(home, _)| home.clone()).collect()
    }

    /// Number of invocations whose first argument is `command`.
    #[must_use]
    pub fn count(&self, command: &str) -> usize {
        self.lock()
            .iter()
            .filter(|(_, args)| args.first().is_some_and(|a| a == command))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, Vec<String>)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, home: &Path, args: &[&str]) -> Result<String> {
        self.lock().push((
            home.to_path_buf(),
            args.iter().map(|a| (*a).to_string()).collect(),
        ));
        (self.handler)(args)
    }
}

/// A non-zero exit of `cf <args>` that printed `output`.
#[must_use]
pub fn command_error(args: &[&str], output: &str) -> Error {
    Error::command_failed(args.first().copied().unwrap_or_default(), "exit status: 1", output)
}
