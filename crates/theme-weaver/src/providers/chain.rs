//! Ordered provider selection: the first provider with a credential wins

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::gemini::GeminiClient;
use super::llm::{CompletionOptions, CompletionProvider};
use super::openai::OpenAiCompatibleClient;

/// Completion text with the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Provider name
    pub provider: String,
    /// Model name
    pub model: String,
}

/// Providers in priority order
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn CompletionProvider>>,
}

impl ProviderChain {
    /// Chain over explicit providers
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>) -> Self {
        Self { providers }
    }

    /// OpenAI, then Gemini, then Groq
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let openai = OpenAiCompatibleClient::new(
            "openai",
            &config.openai_base_url,
            &config.openai_model,
            config.openai_api_key.clone(),
            timeout,
        )?;
        let gemini = GeminiClient::new(
            &config.gemini_base_url,
            &config.gemini_model,
            config.google_api_key.clone(),
            timeout,
        )?;
        let groq = OpenAiCompatibleClient::new(
            "groq",
            &config.groq_base_url,
            &config.groq_model,
            config.groq_api_key.clone(),
            timeout,
        )?;

        let providers: Vec<Arc<dyn CompletionProvider>> =
            vec![Arc::new(openai), Arc::new(gemini), Arc::new(groq)];
        Ok(Self::new(providers))
    }

    /// First configured provider
    pub fn active(&self) -> Result<&Arc<dyn CompletionProvider>> {
        self.providers
            .iter()
            .find(|p| p.is_configured())
            .ok_or(Error::NoProviderConfigured)
    }

    /// Complete with the active provider
    pub async fn complete(
        &self,
        prompt: &str,
        system: &str,
        options: &CompletionOptions,
    ) -> Result<Completion> {
        let provider = self.active()?;
        tracing::debug!("Completing with {} ({})", provider.name(), provider.model());

        let text = provider.complete(prompt, system, options).await?;
        Ok(Completion {
            text,
            provider: provider.name().to_string(),
            model: provider.model().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Provider fake that records prompts and replays canned replies
    pub(crate) struct ScriptedProvider {
        pub name: String,
        pub configured: bool,
        pub replies: Mutex<Vec<Result<String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(name: &str, configured: bool, replies: Vec<Result<String>>) -> Self {
            Self {
                name: name.to_string(),
                configured,
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            prompt: &str,
            _system: &str,
            _options: &CompletionOptions,
        ) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                Ok(format!("{} reply", self.name))
            } else {
                replies.remove(0)
            }
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    #[test]
    fn test_no_provider_configured() {
        let chain = ProviderChain::from_config(&LlmConfig::default()).unwrap();
        assert!(matches!(chain.active(), Err(Error::NoProviderConfigured)));
    }

    #[test]
    fn test_priority_order_from_config() {
        let config = LlmConfig {
            google_api_key: Some("g".to_string()),
            groq_api_key: Some("q".to_string()),
            ..Default::default()
        };
        let chain = ProviderChain::from_config(&config).unwrap();
        let active = chain.active().unwrap();
        assert_eq!(active.name(), "gemini");
        assert_eq!(active.model(), "gemini-pro");
    }

    #[tokio::test]
    async fn test_first_configured_wins() {
        let skipped = Arc::new(ScriptedProvider::new("first", false, vec![]));
        let used = Arc::new(ScriptedProvider::new("second", true, vec![]));
        let later = Arc::new(ScriptedProvider::new("third", true, vec![]));
        let providers: Vec<Arc<dyn CompletionProvider>> =
            vec![skipped.clone(), used.clone(), later.clone()];
        let chain = ProviderChain::new(providers);

        let completion = chain
            .complete("prompt", "system", &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.text, "second reply");
        assert_eq!(completion.provider, "second");
        assert!(skipped.prompts.lock().is_empty());
        assert!(later.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_fall_through() {
        let failing = Arc::new(ScriptedProvider::new(
            "first",
            true,
            vec![Err(Error::provider("first", "timeout"))],
        ));
        let backup = Arc::new(ScriptedProvider::new("second", true, vec![]));
        let providers: Vec<Arc<dyn CompletionProvider>> = vec![failing, backup.clone()];
        let chain = ProviderChain::new(providers);

        let err = chain
            .complete("p", "s", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(backup.prompts.lock().is_empty());
    }
}
