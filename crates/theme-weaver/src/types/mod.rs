//! Core types for the pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{
    composite_id, file_extension, DocumentRecord, ExtractionResult, FileType, SessionScope,
};
pub use query::{ListParams, QueryParams, SearchParams, ThemeRequest};
pub use response::{
    Citation, DocumentAnswer, DocumentSummary, QueryResponse, SearchHit, Theme, ThemeAnalysis,
    ThemeAnalysisResponse, UploadBatchResponse, UploadFailure, UploadResponse,
};
