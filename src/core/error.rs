//! Error taxonomy for the file collection core.
//!
//! Every variant is recoverable: an operation that returns one of these has
//! left the collection, its order and the rename registry untouched.

use std::fmt;

use crate::core::collection::FileId;

/// Why the validator turned a candidate away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Extension not on the allow-list and not a recognized special name
    UnsupportedType,
    /// Larger than the configured ceiling
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnsupportedType => write!(f, "unsupported file type"),
            RejectReason::TooLarge { size, limit } => {
                write!(f, "{size} bytes exceeds the {limit} byte limit")
            }
        }
    }
}

/// Core error type shared by collection, merge building and the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Candidate failed validation; the batch continues without it
    #[error("rejected {name}: {reason}")]
    ValidationRejected { name: String, reason: RejectReason },

    /// Add collision; the caller retries with a fresh id
    #[error("file id already tracked: {0}")]
    DuplicateId(FileId),

    #[error("no tracked file with id {0}")]
    UnknownFile(FileId),

    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error("output filename is required")]
    EmptyOutputName,

    #[error("no files to merge")]
    EmptyCollection,

    /// Upload, preview fetch or merge failed on the backend side
    #[error("{operation} failed: {message}")]
    Collaborator {
        operation: &'static str,
        message: String,
    },
}

impl CoreError {
    pub fn collaborator(operation: &'static str, err: impl fmt::Display) -> Self {
        CoreError::Collaborator {
            operation,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
