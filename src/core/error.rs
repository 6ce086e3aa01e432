//! Error types for the retrieval service.

use thiserror::Error;

/// Result type alias using [`RagError`].
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors raised by the embedding provider, the example store and the
/// retrieval service.
#[derive(Error, Debug)]
pub enum RagError {
    /// The embedding provider failed or returned unusable data.
    #[error("Embedding failed: {message}")]
    Embedding {
        /// Error message.
        message: String,
    },

    /// A request field is missing or out of range.
    #[error("Invalid request: {message}")]
    Validation {
        /// Description of the rejected field.
        message: String,
    },

    /// The underlying storage is unavailable or rejected the operation.
    #[error("Store error: {message}")]
    Store {
        /// Error message.
        message: String,
    },

    /// A vector does not match the dimension already held by the store.
    #[error("Embedding dimension mismatch: store holds {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension recorded by the store.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// No example with the given id.
    #[error("Example not found: {id}")]
    NotFound {
        /// The requested id.
        id: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl RagError {
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Embedding { .. } => "embedding_error",
            Self::Validation { .. } => "invalid_request_error",
            Self::Store { .. } | Self::DimensionMismatch { .. } => "store_error",
            Self::NotFound { .. } => "not_found",
            Self::Config { .. } => "config_error",
        }
    }
}

impl From<rusqlite::Error> for RagError {
    fn from(err: rusqlite::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::embedding(format!("request timed out: {}", err))
        } else {
            Self::embedding(err.to_string())
        }
    }
}
