//! Response types for per-document answers and theme analysis

use serde::{Deserialize, Serialize};

use super::document::DocumentRecord;
use crate::providers::knowledge_store::{Metadata, StoreMatch};

/// Paragraph value for page-only citations
pub const NO_PARAGRAPH: &str = "N/A";

/// Citation parsed from an answer, e.g. `(page 4, para 1-2)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Cited page
    pub page: String,
    /// `"m"`, `"m-k"` or `"N/A"`
    pub paragraph: String,
    /// Full parenthesized group the citation came from
    pub raw_text: String,
}

/// Answer for one document in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnswer {
    /// Short document id, e.g. `DOC002`
    pub doc_id: String,
    /// Model answer, or `Error: ...` when generation failed
    pub answer: String,
    /// Citations parsed from `answer`
    pub citations: Vec<Citation>,
    /// Page count recorded at ingestion
    pub pages: u32,
    /// Model that produced the answer, `None` on failure
    pub model: String,
}

impl DocumentAnswer {
    /// Answer slot for a document whose generation failed
    pub fn failed(doc_id: impl Into<String>, pages: u32, message: impl std::fmt::Display) -> Self {
        Self {
            doc_id: doc_id.into(),
            answer: format!("Error: {}", message),
            citations: Vec::new(),
            pages,
            model: "None".to_string(),
        }
    }

    /// Check whether generation failed for this document
    pub fn is_error(&self) -> bool {
        self.model == "None" && self.answer.starts_with("Error: ")
    }
}

/// A theme identified across documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// `<scope>_theme_<ordinal>`, ordinal starting at 1
    pub theme_id: String,
    /// Theme name
    pub name: String,
    /// Description, empty when the model gave none
    pub description: String,
    /// Raw evidence lines in order
    pub evidence_lines: Vec<String>,
    /// Distinct document references, first-seen order
    pub referenced_document_ids: Vec<String>,
}

/// Result of a theme identification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeAnalysis {
    /// Themes in the order the model listed them
    pub themes: Vec<Theme>,
    /// Model that produced the analysis
    pub model: String,
}

/// Response for the theme analysis endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeAnalysisResponse {
    /// Identified themes
    pub themes: Vec<Theme>,
    /// Model that produced the analysis
    pub model_used: String,
    /// Number of documents analyzed
    pub document_count: usize,
    /// Scope tag the themes were stored under
    pub scope: String,
}

/// Response for a single upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Short document id
    pub doc_id: String,
    /// Session the document was filed under
    pub session: String,
    /// Original file name
    pub filename: String,
    /// Page count
    pub pages: u32,
    /// Extraction confidence
    pub confidence: f32,
    /// Word count
    pub word_count: usize,
    /// Leading excerpt of the extracted text
    pub preview: String,
}

impl UploadResponse {
    /// Number of characters kept in `preview`
    pub const PREVIEW_CHARS: usize = 200;

    /// Build an upload response from a stored record
    pub fn from_record(record: &DocumentRecord, filename: impl Into<String>) -> Self {
        Self {
            doc_id: record.short_id.clone(),
            session: record.session_id.clone(),
            filename: filename.into(),
            pages: record.page_count,
            confidence: record.confidence,
            word_count: record.word_count,
            preview: record.text.chars().take(Self::PREVIEW_CHARS).collect(),
        }
    }
}

/// Per-file upload failure, reported alongside successful uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Original file name
    pub filename: String,
    /// Error message
    pub error: String,
}

/// Response for a multi-file upload request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBatchResponse {
    /// Session all files were filed under
    pub session: String,
    /// Successfully ingested documents
    pub documents: Vec<UploadResponse>,
    /// Files that could not be ingested
    pub failed: Vec<UploadFailure>,
}

/// Stored document summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Composite storage id
    pub id: String,
    /// Short document id
    pub doc_id: String,
    /// Session scope
    pub session: String,
    /// Page count
    pub pages: u32,
    /// Word count
    pub word_count: usize,
}

/// One hit of a document search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record id
    pub id: String,
    /// Record text
    pub text: String,
    /// Record metadata
    pub metadata: Metadata,
    /// Relevance score in [0, 1]
    pub score: f32,
}

impl From<StoreMatch> for SearchHit {
    fn from(hit: StoreMatch) -> Self {
        Self {
            id: hit.record.id,
            text: hit.record.text,
            metadata: hit.record.metadata,
            score: hit.score,
        }
    }
}

/// Response for the query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Original question
    pub query: String,
    /// Session the question ran against
    pub session: String,
    /// One answer per document, in document order
    pub answers: Vec<DocumentAnswer>,
}
