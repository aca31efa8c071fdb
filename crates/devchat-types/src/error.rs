use thiserror::Error;

use crate::llm::LlmError;

/// Errors related to secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found")]
    NotFound,

    #[error("{0} is read-only")]
    ReadOnly(&'static str),

    #[error("no writable secret provider available")]
    NoWritableProvider,

    #[error("invalid secret key '{0}'")]
    InvalidKey(String),

    #[error("no value entered for {0}")]
    Empty(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Errors surfaced by a conversation agent while producing a turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("stopped after {limit} tool rounds without a final answer")]
    ToolRoundsExceeded { limit: u32 },
}

/// Errors related to reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}
