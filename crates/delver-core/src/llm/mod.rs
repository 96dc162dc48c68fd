mod claude;
mod error;
mod openai;
mod provider;
mod retry;

pub use claude::ClaudeClient;
pub use error::LlmError;
pub use openai::OpenAiClient;
pub use provider::Provider;
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;

/// Trait for Large Language Model providers.
///
/// This abstraction allows swapping between different LLM providers
/// without changing the rest of the pipeline.
///
/// # Supported Providers
///
/// - **OpenAI-compatible** (default): Works with OpenAI, Azure, Ollama, vLLM, OpenRouter, etc.
/// - **Anthropic**: Claude models via Anthropic API
/// - **Ollama**: Local models via Ollama
///
/// # Example
///
/// ```ignore
/// use delver_core::llm::{Provider, Llm};
///
/// // Auto-detect from environment
/// let llm = Provider::from_env()?;
///
/// // Or configure explicitly
/// let llm = Provider::Ollama {
///     base_url: None,
///     model: "llama3".to_string(),
/// }.build()?;
///
/// let response = llm.complete("Hello!").await?;
/// ```
#[async_trait]
pub trait Llm: Send + Sync {
    /// Complete a prompt and return the response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Complete a prompt with a system message.
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    /// Complete a prompt with a system message, optionally overriding the
    /// configured model for this one call.
    ///
    /// Roles carry a per-role model choice (a fast model for clarification,
    /// a stronger one for report writing). Providers that support switching
    /// models per request override this; the default ignores the override.
    async fn complete_as(
        &self,
        system: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, LlmError> {
        let _ = model;
        self.complete_with_system(system, prompt).await
    }
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl Llm for Box<dyn Llm> {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        (**self).complete_with_system(system, prompt).await
    }

    async fn complete_as(
        &self,
        system: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, LlmError> {
        (**self).complete_as(system, prompt, model).await
    }
}
