//! Replication service keys.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// Which replication payload a service key carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Hostname, IP and role of the instance.
    HostInfo,
    /// Replication username and password plus peer info.
    Credentials,
}

impl KeyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HostInfo => "host-info",
            Self::Credentials => "credentials",
        }
    }

    /// Arbitrary parameters sent with `create-service-key`.
    #[must_use]
    pub fn request_params(self) -> String {
        serde_json::json!({ "replication-request": self.as_str() }).to_string()
    }

    /// Service key name, unique per second.
    #[must_use]
    pub fn key_name(self, unix_time: i64) -> String {
        format!("{}-{unix_time}", self.as_str())
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON payload of a replication key, forwarded verbatim to the peer.
#[derive(Clone, PartialEq, Eq)]
pub struct ReplicationKey {
    kind: KeyKind,
    payload: String,
}

impl ReplicationKey {
    /// Extract the nested `credentials` object from `cf service-key` output.
    ///
    /// Banner lines before the JSON document are skipped.
    ///
    /// # Errors
    ///
    /// Returns a parse error if no JSON document with a `credentials` object
    /// is present.
    pub fn extract(kind: KeyKind, output: &str) -> Result<Self> {
        let start = output
            .lines()
            .position(|line| line.trim_start().starts_with('{'))
            .ok_or_else(|| Error::service_key_parse_failed(kind, "no JSON document in output"))?;
        let document: String = output.lines().skip(start).collect::<Vec<_>>().join("\n");

        let value: Value = serde_json::from_str(&document)
            .map_err(|e| Error::service_key_parse_failed(kind, e.to_string()))?;
        let credentials = value
            .get("credentials")
            .filter(|c| c.is_object())
            .ok_or_else(|| Error::service_key_parse_failed(kind, "missing credentials object"))?;

        let payload = serde_json::to_string(credentials)
            .map_err(|e| Error::service_key_parse_failed(kind, e.to_string()))?;
        Ok(Self { kind, payload })
    }

    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    /// The payload, ready to pass as `update-service -c`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.payload
    }
}

// The credentials payload carries a password; keep it out of logs.
impl fmt::Debug for ReplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationKey")
            .field("kind", &self.kind)
            .field("payload", &"<redacted>")
            .finish()
    }
}
