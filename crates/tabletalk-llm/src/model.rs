//! Language model abstraction

use thiserror::Error;

/// Errors from the model layer
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to reach the model server: {0}")]
    RequestFailed(String),

    #[error("Model server returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("Model '{0}' is not available on the server")]
    ModelMissing(String),

    #[error("The model server timed out")]
    Timeout,

    #[error("Prompt template error: {0}")]
    TemplateError(String),
}

/// Trait for language models the pipeline can prompt
///
/// The pipeline only ever needs plain text completion; structured output
/// is handled downstream by SQL extraction and the guard.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// The model identifier, for logs
    fn model(&self) -> &str;

    /// Complete a prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Check that the model server is reachable before starting a
    /// session.
    async fn health_check(&self) -> Result<(), LlmError>;
}
