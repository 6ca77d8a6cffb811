//! Document ingestion: session ids, OCR-aware extraction, indexing

pub mod coordinator;
pub mod engines;
pub mod extraction;
pub mod session_ids;

pub use coordinator::IngestionCoordinator;
pub use engines::{LocalPdfBackend, OcrEngine, OcrLine, PdfBackend, TesseractOcr};
pub use extraction::{ExtractionStrategy, Extractor};
pub use session_ids::{format_short_id, CounterHandle, SessionIdAllocator};
