//! Parsing of `cf service` output.

use std::fmt;

/// Phrase cf prints when the named instance does not exist in the space.
#[must_use]
pub fn not_found_message(instance: &str) -> String {
    format!("Service instance '{instance}' not found")
}

/// State of the most recent asynchronous operation on an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    /// Anything else, including no reported operation.
    Other(String),
}

impl OperationState {
    /// Classify a status value such as `update in progress`.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        let status = status.trim();
        let lowered = status.to_ascii_lowercase();
        if lowered.ends_with("in progress") {
            Self::InProgress
        } else if lowered.ends_with("failed") {
            Self::Failed
        } else if lowered.ends_with("succeeded") {
            Self::Succeeded
        } else {
            Self::Other(status.to_string())
        }
    }

    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Other(s) if s.is_empty() => write!(f, "unknown"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Last operation as reported by `cf service`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOperation {
    pub state: OperationState,
    pub description: String,
}

impl LastOperation {
    #[must_use]
    pub fn from_service_output(output: &str) -> Self {
        let state = OperationState::parse(label_value(output, "status").unwrap_or_default());
        let description = label_value(output, "message").unwrap_or_default().to_string();
        Self { state, description }
    }
}

/// Plan name from the `plan:` label.
#[must_use]
pub fn plan_name(output: &str) -> Option<String> {
    label_value(output, "plan")
        .filter(|plan| !plan.is_empty())
        .map(str::to_string)
}

/// Value of the first `label: value` line, matching the label
/// case-insensitively.
fn label_value<'a>(output: &'a str, label: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let (key, value) = line.trim_start().split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(label)
            .then(|| value.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_OUTPUT: &str = "\
Showing info of service db0 in org system / space mysql as admin...

name:            db0
guid:            5b1ee5ae-ff27-4f4e-a1f6-7d0a1bc5ab59
type:            managed
broker:          dedicated-mysql-broker
offering:        p.mysql
plan:            db-leader-follower

Showing status of last operation:
   status:    update in progress
   message:   Instance update in progress
   started:   2024-03-01T10:00:00Z
   updated:   2024-03-01T10:00:05Z";

    #[test]
    fn test_parses_plan_name() {
        assert_eq!(plan_name(SERVICE_OUTPUT).as_deref(), Some("db-leader-follower"));
    }

    #[test]
    fn test_missing_plan_label() {
        assert_eq!(plan_name("name: db0\ntype: managed"), None);
        assert_eq!(plan_name("plan:"), None);
    }

    #[test]
    fn test_parses_last_operation() {
        let last = LastOperation::from_service_output(SERVICE_OUTPUT);
        assert_eq!(last.state, OperationState::InProgress);
        assert_eq!(last.description, "Instance update in progress");
    }

    #[test]
    fn test_legacy_capitalized_labels() {
        let last = LastOperation::from_service_output("Status: update failed\nMessage: broker timed out");
        assert_eq!(last.state, OperationState::Failed);
        assert_eq!(last.description, "broker timed out");
    }

    #[test]
    fn test_state_classification() {
        assert_eq!(OperationState::parse("create succeeded"), OperationState::Succeeded);
        assert_eq!(OperationState::parse("in progress"), OperationState::InProgress);
        assert_eq!(OperationState::parse("update failed"), OperationState::Failed);
        assert_eq!(
            OperationState::parse("delete pending"),
            OperationState::Other("delete pending".to_string())
        );
    }

    #[test]
    fn test_absent_status_is_other() {
        let last = LastOperation::from_service_output("name: db0");
        assert_eq!(last.state, OperationState::Other(String::new()));
        assert_eq!(last.state.to_string(), "unknown");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(not_found_message("db0"), "Service instance 'db0' not found");
    }
}
