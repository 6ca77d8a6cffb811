//! Application state for the server

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::generation::ThemeIdentifier;
use crate::ingestion::{Extractor, IngestionCoordinator};
use crate::providers::{KnowledgeStore, LocalKnowledgeStore, ProviderChain};
use crate::retrieval::QueryProcessor;
use crate::types::SessionScope;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn KnowledgeStore>,
    providers: Arc<ProviderChain>,
    ingestion: IngestionCoordinator,
    query: QueryProcessor,
    themes: ThemeIdentifier,
    theme_runs: AtomicU64,
}

impl AppState {
    /// Build state from configuration: JSON knowledge store, Tesseract and
    /// poppler extraction, configured completion providers
    pub fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn KnowledgeStore> =
            Arc::new(LocalKnowledgeStore::open(&config.storage.store_path)?);
        tracing::info!("Knowledge store at {}", config.storage.store_path.display());

        let extractor = Arc::new(Extractor::from_config(&config.extraction));
        let providers = Arc::new(ProviderChain::from_config(&config.llm)?);

        match providers.active() {
            Ok(provider) => tracing::info!(
                "Completion provider: {} ({})",
                provider.name(),
                provider.model()
            ),
            Err(_) => tracing::warn!(
                "No LLM API key configured; queries and theme analysis will fail"
            ),
        }

        Ok(Self::from_parts(config, store, extractor, providers))
    }

    /// Assemble state from prebuilt components
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn KnowledgeStore>,
        extractor: Arc<Extractor>,
        providers: Arc<ProviderChain>,
    ) -> Self {
        let ingestion =
            IngestionCoordinator::new(&config.storage.data_dir, extractor, store.clone());
        let query = QueryProcessor::new(store.clone(), providers.clone(), &config.llm, &config.query);
        let themes = ThemeIdentifier::new(providers.clone(), store.clone(), &config.themes);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                providers,
                ingestion,
                query,
                themes,
                theme_runs: AtomicU64::new(0),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the knowledge store
    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.inner.store
    }

    /// Get the completion providers
    pub fn providers(&self) -> &ProviderChain {
        &self.inner.providers
    }

    /// Get the ingestion coordinator
    pub fn ingestion(&self) -> &IngestionCoordinator {
        &self.inner.ingestion
    }

    /// Get the query processor
    pub fn query(&self) -> &QueryProcessor {
        &self.inner.query
    }

    /// Get the theme identifier
    pub fn themes(&self) -> &ThemeIdentifier {
        &self.inner.themes
    }

    /// Fresh scope tag for one theme analysis run
    pub fn next_theme_scope(&self) -> String {
        let run = self.inner.theme_runs.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", SessionScope::timestamped(), run)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ingestion::extraction::tests::{line, FakeOcr, FakePdf};
    use crate::providers::chain::tests::ScriptedProvider;
    use crate::providers::CompletionProvider;

    /// State over an in-memory store, fake engines and a scripted provider
    pub(crate) fn test_state(
        data_dir: &std::path::Path,
        provider: Arc<ScriptedProvider>,
    ) -> (AppState, Arc<LocalKnowledgeStore>) {
        let mut config = AppConfig::default();
        config.storage.data_dir = data_dir.to_path_buf();

        let store = Arc::new(LocalKnowledgeStore::in_memory());
        let extractor = Extractor::new(
            Arc::new(FakeOcr::new(vec![vec![line("ocr text", 0.8)]])),
            Arc::new(FakePdf {
                texts: Ok(vec!["A text layer long enough to keep.".to_string()]),
                rendered: 1,
            }),
            &config.extraction,
        );
        let providers: Vec<Arc<dyn CompletionProvider>> = vec![provider];

        let state = AppState::from_parts(
            config,
            store.clone(),
            Arc::new(extractor),
            Arc::new(ProviderChain::new(providers)),
        );
        (state, store)
    }

    #[test]
    fn test_theme_scopes_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new("p", true, vec![]));
        let (state, _) = test_state(dir.path(), provider);

        let a = state.next_theme_scope();
        let b = state.next_theme_scope();
        assert_ne!(a, b);
        assert!(SessionScope::new(a).is_ok());
    }
}
