//! Error types for the foundation crate.

use thiserror::Error;

use crate::key::KeyKind;
use crate::task::TaskState;

/// Result type for foundation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving one foundation's control plane.
#[derive(Error, Debug)]
pub enum Error {
    /// The control plane confirmed the instance is absent.
    #[error("instance '{instance}' does not exist")]
    InstanceNotFound { instance: String },

    /// Existence could not be determined either way.
    #[error("error when checking whether instance exists: {source}")]
    InstanceLookupFailed { source: mysql_tools_core::Error },

    #[error("error when checking plan name of instance '{instance}': {source}")]
    PlanLookupFailed {
        instance: String,
        source: mysql_tools_core::Error,
    },

    /// The status output carried no `plan:` label.
    #[error("plan not found for service instance '{instance}'")]
    PlanNotFound { instance: String },

    /// The marketplace of this foundation does not list the plan.
    #[error("[{foundation}] Plan '{plan}' does not exist")]
    PlanDoesNotExist { foundation: String, plan: String },

    #[error("failed to create service key: {source}")]
    ServiceKeyCreateFailed { source: mysql_tools_core::Error },

    #[error("failed to retrieve service-key '{key_name}' on instance '{instance}': {source}")]
    ServiceKeyRetrieveFailed {
        key_name: String,
        instance: String,
        source: mysql_tools_core::Error,
    },

    #[error("failed to parse {kind} service key: {reason}")]
    ServiceKeyParseFailed { kind: KeyKind, reason: String },

    /// The control plane reported the asynchronous operation as failed.
    #[error("failed to {operation} '{instance}': {description}")]
    OperationFailed {
        operation: String,
        instance: String,
        description: String,
    },

    #[error("failed to retrieve an app by name: {reason}")]
    AppLookupFailed { reason: String },

    #[error("failed to create a task: {reason}")]
    TaskCreateFailed { reason: String },

    /// Error document returned by the cloud controller API.
    #[error("cc error code {code}: {title} - {detail}")]
    Api {
        code: i64,
        title: String,
        detail: String,
    },

    #[error("task completed with status \"{state}\"")]
    TaskFailed { state: TaskState },

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error(transparent)]
    Core(#[from] mysql_tools_core::Error),
}

impl Error {
    /// Create an instance not found error.
    pub fn instance_not_found(instance: impl Into<String>) -> Self {
        Self::InstanceNotFound {
            instance: instance.into(),
        }
    }

    /// Create a plan lookup failed error.
    pub fn plan_lookup_failed(instance: impl Into<String>, source: mysql_tools_core::Error) -> Self {
        Self::PlanLookupFailed {
            instance: instance.into(),
            source,
        }
    }

    /// Create a plan not found error.
    pub fn plan_not_found(instance: impl Into<String>) -> Self {
        Self::PlanNotFound {
            instance: instance.into(),
        }
    }

    /// Create a plan does not exist error.
    pub fn plan_does_not_exist(foundation: impl Into<String>, plan: impl Into<String>) -> Self {
        Self::PlanDoesNotExist {
            foundation: foundation.into(),
            plan: plan.into(),
        }
    }

    /// Create a service key parse error.
    pub fn service_key_parse_failed(kind: KeyKind, reason: impl Into<String>) -> Self {
        Self::ServiceKeyParseFailed {
            kind,
            reason: reason.into(),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(
        operation: impl Into<String>,
        instance: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            instance: instance.into(),
            description: description.into(),
        }
    }

    /// Create a config error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }
}
