/// Registry client error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Blob {digest} not found at '{reference}'")]
    NotFound { reference: String, digest: String },

    #[error("Registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry rejected blob: {0}")]
    Rejected(String),
}

impl RegistryError {
    /// Create a rejected error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
