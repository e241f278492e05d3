/// Unified error type for the transport core
use std::time::Duration;
use thiserror::Error;

use super::registry::RegistryError;

#[derive(Error, Debug)]
pub enum TransportError {
    // Codec errors
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Stage precondition errors
    #[error("Unsupported access type: {0}")]
    UnsupportedAccessType(String),

    #[error("Stage timed out after {after:?}")]
    Timeout { after: Duration },

    // Registry errors
    #[error("Unable to upload blob to '{reference}': {source}")]
    UploadFailed {
        reference: String,
        #[source]
        source: RegistryError,
    },

    #[error("Unable to download blob from '{reference}': {source}")]
    DownloadFailed {
        reference: String,
        #[source]
        source: RegistryError,
    },

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure of a single pipeline stage, 1-indexed.
    #[error("Stage {index} '{name}' failed: {source}")]
    Stage {
        index: usize,
        name: String,
        #[source]
        source: Box<TransportError>,
    },
}

/// Result type alias using TransportError
pub type Result<T> = std::result::Result<T, TransportError>;

/// Kind of a [`TransportError`], looking through stage wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedMessage,
    Io,
    UnsupportedAccessType,
    Timeout,
    UploadFailed,
    DownloadFailed,
    DigestMismatch,
    InvalidConfig,
}

impl TransportError {
    /// Create a malformed message error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Create an unsupported access type error
    pub fn unsupported_access(access_type: impl Into<String>) -> Self {
        Self::UnsupportedAccessType(access_type.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap an error with the stage it occurred in
    pub fn in_stage(self, index: usize, name: impl Into<String>) -> Self {
        Self::Stage {
            index,
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all stage wrappers removed
    pub fn root(&self) -> &TransportError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Index of the outermost failing stage, if the error came from a stage
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::MalformedMessage(_) => ErrorKind::MalformedMessage,
            Self::Io(_) => ErrorKind::Io,
            Self::UnsupportedAccessType(_) => ErrorKind::UnsupportedAccessType,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::UploadFailed { .. } => ErrorKind::UploadFailed,
            Self::DownloadFailed { .. } => ErrorKind::DownloadFailed,
            Self::DigestMismatch { .. } => ErrorKind::DigestMismatch,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Stage { .. } => unreachable!("root() strips stage wrappers"),
        }
    }
}

// Structured sections are JSON; a parse failure means the frame is corrupt
impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}
