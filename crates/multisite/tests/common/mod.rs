//! Shared fakes for the workflow tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mysql_tools_foundation::{
    Error, KeyKind, ReplicationKey, Result, ServiceControlClient,
};
use mysql_tools_multisite::Logger;

/// Calls made across every client sharing it, in order.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }
}

/// Payload the fake puts in a key created on `site`/`instance`.
pub fn key_payload(kind: KeyKind, site: &str, instance: &str) -> String {
    format!(r#"{{"{kind}":"{site}/{instance}"}}"#)
}

pub struct RecordingClient {
    id: String,
    trace: Trace,
    plan: String,
    offered: Option<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl RecordingClient {
    pub fn new(id: &str, trace: &Trace) -> Self {
        Self {
            id: id.to_string(),
            trace: trace.clone(),
            plan: "db-small".to_string(),
            offered: None,
            fail_on: None,
        }
    }

    /// Plan reported for every instance.
    pub fn with_plan(mut self, plan: &str) -> Self {
        self.plan = plan.to_string();
        self
    }

    /// Restrict the marketplace to `plans`.
    pub fn offering(mut self, plans: &[&str]) -> Self {
        self.offered = Some(plans.iter().map(|p| (*p).to_string()).collect());
        self
    }

    /// Fail every call of `operation` with an operation-failed error.
    pub fn fail_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    fn record(&self, operation: &'static str, args: fmt::Arguments<'_>) -> Result<()> {
        self.trace.push(format!("{}.{operation}({args})", self.id));
        if self.fail_on == Some(operation) {
            return Err(Error::operation_failed(operation, &self.id, "injected failure"));
        }
        Ok(())
    }

    fn key(&self, kind: KeyKind, instance: &str) -> Result<ReplicationKey> {
        let payload = key_payload(kind, &self.id, instance);
        ReplicationKey::extract(kind, &format!(r#"{{"credentials": {payload}}}"#))
    }

    pub fn into_arc(self) -> Arc<dyn ServiceControlClient> {
        Arc::new(self)
    }
}

#[async_trait]
impl ServiceControlClient for RecordingClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn instance_exists(&self, instance: &str) -> Result<()> {
        self.record("instance_exists", format_args!("{instance}"))
    }

    async fn instance_plan_name(&self, instance: &str) -> Result<String> {
        self.record("instance_plan_name", format_args!("{instance}"))?;
        Ok(self.plan.clone())
    }

    async fn plan_exists(&self, plan: &str) -> Result<()> {
        self.record("plan_exists", format_args!("{plan}"))?;
        match &self.offered {
            Some(plans) if !plans.iter().any(|p| p == plan) => {
                Err(Error::plan_does_not_exist(&self.id, plan))
            }
            _ => Ok(()),
        }
    }

    async fn create_host_info_key(&self, instance: &str) -> Result<ReplicationKey> {
        self.record("create_host_info_key", format_args!("{instance}"))?;
        self.key(KeyKind::HostInfo, instance)
    }

    async fn create_credentials_key(&self, instance: &str) -> Result<ReplicationKey> {
        self.record("create_credentials_key", format_args!("{instance}"))?;
        self.key(KeyKind::Credentials, instance)
    }

    async fn update_service_and_wait(
        &self,
        instance: &str,
        params: &str,
        plan: Option<&str>,
    ) -> Result<()> {
        self.record(
            "update_service_and_wait",
            format_args!("{instance}, {params}, {plan:?}"),
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, line: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
