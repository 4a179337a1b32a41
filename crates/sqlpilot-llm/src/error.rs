//! Error types for LLM calls.

use thiserror::Error;

/// Errors raised while talking to the model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The API key environment variable is unset.
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),

    /// Transport-level failure reaching the provider.
    #[error("request to model provider failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("model provider returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider answered successfully but with no choices.
    #[error("model provider returned an empty response")]
    EmptyResponse,
}
