//! Cross-document theme identification

use std::collections::HashSet;
use std::sync::Arc;

use super::prompt::{PromptBuilder, ThemeInput, THEME_SYSTEM};
use super::theme_parser::{theme_from_record, ThemeResponseParser};
use crate::config::ThemeConfig;
use crate::error::{Error, Result};
use crate::providers::{CompletionOptions, KnowledgeStore, MetadataFilter, ProviderChain};
use crate::types::{SessionScope, Theme, ThemeAnalysis};

/// Pair texts with labels: the given ids where present, `Document <i>` otherwise
pub fn label_documents(texts: Vec<String>, ids: &[String]) -> Vec<ThemeInput> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| ThemeInput {
            label: ids
                .get(i)
                .filter(|id| !id.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Document {}", i + 1)),
            text,
        })
        .collect()
}

/// Identifies themes shared across documents
pub struct ThemeIdentifier {
    providers: Arc<ProviderChain>,
    store: Arc<dyn KnowledgeStore>,
    parser: ThemeResponseParser,
    excerpt_chars: usize,
    options: CompletionOptions,
}

impl ThemeIdentifier {
    /// Create an identifier persisting themes into `store`
    pub fn new(
        providers: Arc<ProviderChain>,
        store: Arc<dyn KnowledgeStore>,
        config: &ThemeConfig,
    ) -> Self {
        Self {
            providers,
            parser: ThemeResponseParser::new(store.clone()),
            store,
            excerpt_chars: config.excerpt_chars,
            options: CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        }
    }

    /// Ask the active provider for themes and parse them under `scope_tag`
    pub async fn identify_themes(
        &self,
        documents: &[ThemeInput],
        scope_tag: &str,
    ) -> Result<ThemeAnalysis> {
        if documents.is_empty() {
            return Err(Error::DocumentNotFound(
                "no documents to analyze".to_string(),
            ));
        }

        let prompt = PromptBuilder::theme_analysis(documents, self.excerpt_chars);
        let completion = self
            .providers
            .complete(&prompt, THEME_SYSTEM, &self.options)
            .await?;

        let themes = self.parser.parse(&completion.text, scope_tag).await?;
        tracing::info!(
            "Identified {} themes across {} documents with {}",
            themes.len(),
            documents.len(),
            completion.model
        );

        Ok(ThemeAnalysis {
            themes,
            model: completion.model,
        })
    }

    /// Identify themes of a session's documents, stored under the session
    /// scope. Themes left over from an earlier, longer run are removed once
    /// the new run has been parsed.
    pub async fn identify_session_themes(
        &self,
        documents: &[ThemeInput],
        session: &SessionScope,
    ) -> Result<ThemeAnalysis> {
        let analysis = self.identify_themes(documents, session.as_str()).await?;

        let current: HashSet<&str> = analysis.themes.iter().map(|t| t.theme_id.as_str()).collect();
        let stale: Vec<String> = self
            .stored_themes(session.as_str())
            .await?
            .into_iter()
            .map(|theme| theme.theme_id)
            .filter(|id| !current.contains(id.as_str()))
            .collect();

        if !stale.is_empty() {
            let removed = self.store.delete(&stale).await?;
            tracing::info!("Removed {} stale themes from session '{}'", removed, session);
        }
        Ok(analysis)
    }

    /// Themes stored under `scope_tag`
    pub async fn stored_themes(&self, scope_tag: &str) -> Result<Vec<Theme>> {
        let filter = MetadataFilter::new().eq("timestamp", scope_tag).has("name");
        let records = self.store.get_where(&filter).await?;
        Ok(records.into_iter().map(theme_from_record).collect())
    }

    /// One stored theme by id
    pub async fn theme(&self, theme_id: &str) -> Result<Theme> {
        match self.store.get(theme_id).await? {
            Some(record) if record.metadata.contains_key("name") => Ok(theme_from_record(record)),
            _ => Err(Error::DocumentNotFound(theme_id.to_string())),
        }
    }
}
