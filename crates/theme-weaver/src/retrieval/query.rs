//! Per-document question answering over one session

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{LlmConfig, QueryConfig};
use crate::error::Result;
use crate::generation::prompt::DOCUMENT_QA_SYSTEM;
use crate::generation::{CitationParser, PromptBuilder};
use crate::providers::{
    CompletionOptions, KnowledgeStore, MetadataFilter, ProviderChain, StoreRecord,
};
use crate::types::{DocumentAnswer, SessionScope};

/// Answers a question against each document of a session
pub struct QueryProcessor {
    store: Arc<dyn KnowledgeStore>,
    providers: Arc<ProviderChain>,
    context_chars: usize,
    options: CompletionOptions,
}

impl QueryProcessor {
    /// Create a query processor
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        providers: Arc<ProviderChain>,
        llm: &LlmConfig,
        query: &QueryConfig,
    ) -> Self {
        Self {
            store,
            providers,
            context_chars: query.document_context_chars,
            options: CompletionOptions {
                temperature: llm.temperature,
                max_tokens: llm.max_tokens,
            },
        }
    }

    /// Document records of a session, in ingestion order
    pub async fn session_documents(&self, session: &SessionScope) -> Result<Vec<StoreRecord>> {
        let filter = MetadataFilter::new()
            .eq("timestamp", session.as_str())
            .has("doc_id");
        self.store.get_where(&filter).await
    }

    /// Answer `question` for every document in `session`.
    ///
    /// Documents are answered concurrently; results keep document order. A
    /// failed completion becomes an `Error: ...` answer for that document
    /// only.
    pub async fn process_query(
        &self,
        question: &str,
        session: &SessionScope,
    ) -> Result<Vec<DocumentAnswer>> {
        let documents = self.session_documents(session).await?;
        tracing::info!(
            "Answering query across {} documents in session '{}'",
            documents.len(),
            session
        );

        let answers = join_all(
            documents
                .iter()
                .map(|record| self.answer_document(question, record)),
        )
        .await;

        Ok(answers)
    }

    async fn answer_document(&self, question: &str, record: &StoreRecord) -> DocumentAnswer {
        let doc_id = record
            .metadata
            .get("doc_id")
            .and_then(Value::as_str)
            .unwrap_or(&record.id)
            .to_string();
        let pages = record
            .metadata
            .get("pages")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;

        let prompt = PromptBuilder::document_question(question, &record.text, self.context_chars);
        match self
            .providers
            .complete(&prompt, DOCUMENT_QA_SYSTEM, &self.options)
            .await
        {
            Ok(completion) => DocumentAnswer {
                citations: CitationParser::parse(&completion.text),
                doc_id,
                answer: completion.text,
                pages,
                model: completion.model,
            },
            Err(e) => {
                tracing::warn!("Answer for {} failed: {}", doc_id, e);
                DocumentAnswer::failed(doc_id, pages, e)
            }
        }
    }
}
