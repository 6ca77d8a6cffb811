//! Completion provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Sampling settings for one completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 800,
        }
    }
}

/// Trait for chat-style text completion
///
/// Implementations:
/// - `OpenAiCompatibleClient`: OpenAI and Groq chat completions
/// - `GeminiClient`: Google Generative Language API
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt` under a system instruction
    async fn complete(&self, prompt: &str, system: &str, options: &CompletionOptions)
        -> Result<String>;

    /// Whether a credential is present
    fn is_configured(&self) -> bool;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
