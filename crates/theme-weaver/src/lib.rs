//! theme-weaver: document research backend
//!
//! Ingests scanned or digital documents into upload sessions (OCR-aware text
//! extraction with per-session `DOC001`-style ids), answers questions against
//! each document with parsed page/paragraph citations, and identifies themes
//! across documents from free-form model output.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use generation::{CitationParser, ThemeIdentifier, ThemeResponseParser};
pub use ingestion::{ExtractionStrategy, IngestionCoordinator, SessionIdAllocator};
pub use retrieval::QueryProcessor;
pub use types::{Citation, DocumentRecord, SessionScope, Theme};
