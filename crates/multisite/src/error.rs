//! Error types for saved foundation targets.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The name is not a single path component.
    #[error("invalid target name {name:?}")]
    InvalidTargetName { name: String },

    /// The saved cf configuration is not logged in to a space.
    #[error("saved configuration must target Cloudfoundry: missing fields: [{}]", .fields.join(","))]
    IncompleteTarget { fields: Vec<&'static str> },

    #[error("failed to parse cf configuration {}: {reason}", .path.display())]
    ParseFailed { path: PathBuf, reason: String },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not determine the home directory")]
    NoHomeDirectory,
}

impl Error {
    /// Create an I/O error tagged with the path involved.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid target name error.
    pub fn invalid_target_name(name: impl Into<String>) -> Self {
        Self::InvalidTargetName { name: name.into() }
    }
}
