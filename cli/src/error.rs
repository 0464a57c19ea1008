//! Error types for the AstroIntel CLI.

use astrointel_retrieval::RetrievalError;
use thiserror::Error;

/// Errors that can occur while answering questions.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::EmptyQuestion => 2,
            CliError::Retrieval(e) if e.is_model_failure() => 3,
            _ => 1,
        }
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
