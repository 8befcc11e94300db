pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No language model API key configured (set GOOGLE_GENERATIVE_AI_API_KEY)")]
    MissingApiKey,

    #[error("Language model request failed: {0}")]
    Request(String),

    #[error("Language model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// A hosted text-generation model: one prompt in, one text out.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the fixed review instruction around a pull request diff.
///
/// The diff is embedded verbatim in a fenced `diff` block and the model is
/// asked for Markdown feedback under Style, Security, Performance and Design.
pub fn build_prompt(diff: &str) -> String {
    format!(
        "You are an expert AI code reviewer. Review the following GitHub pull request diff:\n\
         \n\
         ```diff\n\
         {diff}\n\
         ```\n\
         \n\
         Give categorized feedback on Style, Security, Performance, and Design. \
         Format your response in Markdown."
    )
}
