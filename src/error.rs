// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline initialization failed: {0}")]
    Initialization(String),

    #[error("Pipeline invocation failed: {0}")]
    Invocation(String),

    #[error("Pipeline disposal failed: {0}")]
    Disposal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl PipelineError {
    /// Message shown to the user in the status sink.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Initialization(msg)
            | PipelineError::Invocation(msg)
            | PipelineError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
