//! Error types for TruAi Core
//!
//! This module defines the error types used throughout the decision and
//! authorization pipeline. We use `thiserror` for ergonomic error definitions
//! with automatic Display/Error implementations.
//!
//! Negative business outcomes (a denied maintenance request, a classification
//! with no keyword match, an ignored source override) are *not* errors: they
//! are ordinary return values. Errors are reserved for invalid input and for
//! storage that could not be written.

use thiserror::Error;

/// Result type alias for TruAi operations
pub type Result<T> = std::result::Result<T, TruAiError>;

/// Main error type for TruAi operations
#[derive(Error, Debug)]
pub enum TruAiError {
    /// A required field was absent or empty
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A payload could not be interpreted as the expected entry type
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Command text did not match any supported maintenance action
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Policy identifier outside the immutable policy set
    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    /// Audit stream could not be written or read
    #[error("storage failure on {stream}: {source}")]
    Storage {
        stream: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<TruAiError>,
    },
}

impl From<toml::de::Error> for TruAiError {
    fn from(e: toml::de::Error) -> Self {
        TruAiError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for TruAiError {
    fn from(e: toml::ser::Error) -> Self {
        TruAiError::Config(e.to_string())
    }
}

impl TruAiError {
    /// Wrap an I/O error raised while touching a named stream
    pub fn storage(stream: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            stream: stream.into(),
            source,
        }
    }

    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error means an audit record was not durably written
    pub fn is_storage_failure(&self) -> bool {
        match self {
            Self::Storage { .. } | Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_storage_failure(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
