use thiserror::Error;

/// Unified error type for version resolution
#[derive(Error, Debug)]
pub enum AutoVersionError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source data error: {0}")]
    SourceData(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("No version source available: {0}")]
    ResolutionExhausted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-autoversion
pub type Result<T> = std::result::Result<T, AutoVersionError>;

impl AutoVersionError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutoVersionError::Config(msg.into())
    }

    /// Create an error for malformed data handed over by the repository
    pub fn source_data(msg: impl Into<String>) -> Self {
        AutoVersionError::SourceData(msg.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        AutoVersionError::UnsupportedOperation(msg.into())
    }

    /// Create an error for an empty candidate list
    pub fn exhausted(msg: impl Into<String>) -> Self {
        AutoVersionError::ResolutionExhausted(msg.into())
    }
}
