//! CLI error types

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Core error: {0}")]
    CoreError(#[from] altair_core::CoreError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CliError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CliError::CommandFailed(_) => "CLI001",
            CliError::CoreError(_) => "CLI002",
            CliError::SerializationError(_) => "CLI003",
        }
    }
}

/// CLI-specific result type
pub type Result<T> = std::result::Result<T, CliError>;
