//! Upload ingestion: id allocation, raw file storage, extraction, indexing

use std::path::PathBuf;
use std::sync::Arc;

use super::extraction::Extractor;
use super::session_ids::{CounterHandle, SessionIdAllocator};
use crate::error::Result;
use crate::providers::KnowledgeStore;
use crate::types::{file_extension, DocumentRecord, SessionScope};

/// Drives one upload through the pipeline
pub struct IngestionCoordinator {
    data_dir: PathBuf,
    allocator: SessionIdAllocator,
    extractor: Arc<Extractor>,
    store: Arc<dyn KnowledgeStore>,
}

impl IngestionCoordinator {
    /// Create a coordinator storing session folders under `data_dir`
    pub fn new(
        data_dir: impl Into<PathBuf>,
        extractor: Arc<Extractor>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            allocator: SessionIdAllocator::new(),
            extractor,
            store,
        }
    }

    /// Folder holding one session's raw files and counter
    pub fn session_dir(&self, session: &SessionScope) -> PathBuf {
        self.data_dir.join(session.as_str())
    }

    /// Ingest one uploaded file into `session`.
    ///
    /// The file type is checked before an id is allocated, so rejected
    /// uploads don't consume one. Later failures leave the id consumed.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        original_file_name: &str,
        session: &SessionScope,
    ) -> Result<DocumentRecord> {
        let extension = file_extension(original_file_name);
        let strategy = self.extractor.strategy_for(&extension)?;

        let counter = CounterHandle::for_session(&self.data_dir, session);
        let short_id = self.allocator.next(&counter).await?;

        let session_dir = self.session_dir(session);
        tokio::fs::create_dir_all(&session_dir).await?;
        let file_path = session_dir.join(format!("{}{}", short_id, extension));
        tokio::fs::write(&file_path, bytes).await?;

        let extraction = self.extractor.run(strategy, &file_path).await?;
        let record = DocumentRecord::from_extraction(session, short_id, extraction);

        self.store
            .put(&record.composite_id(), &record.text, record.metadata())
            .await?;

        tracing::info!(
            "Ingested '{}' as {} ({} pages, {} words)",
            original_file_name,
            record.composite_id(),
            record.page_count,
            record.word_count
        );
        Ok(record)
    }
}
