//! Document, session and extraction types

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::knowledge_store::Metadata;

/// Supported upload file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document (text layer, OCR fallback for scans)
    Pdf,
    /// Raster image, always OCR'd
    Image,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Detect file type from an extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" | "bmp" => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// Lowercased extension of a file name including the leading dot, or `""`
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Timestamp-derived namespace grouping one upload batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionScope(String);

impl SessionScope {
    /// Validate an existing scope string.
    ///
    /// The scope doubles as a directory name, so only ASCII alphanumerics,
    /// `_`, `-` and `.` are accepted, and it may not start with a dot.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid_chars = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if value.is_empty() || !valid_chars || value.starts_with('.') {
            return Err(Error::InvalidSession(value));
        }
        Ok(Self(value))
    }

    /// Fresh scope from the current UTC time (millisecond resolution)
    pub fn timestamped() -> Self {
        Self(chrono::Utc::now().format("%Y%m%d%H%M%S%3f").to_string())
    }

    /// Borrow the scope string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionScope {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionScope> for String {
    fn from(scope: SessionScope) -> Self {
        scope.0
    }
}

/// Output of a text extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Extracted text
    pub text: String,
    /// Page count (at least 1)
    pub pages: u32,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Whitespace-delimited token count of `text`
    pub word_count: usize,
}

impl ExtractionResult {
    /// Build a result, deriving the word count and clamping the inputs
    pub fn new(text: String, pages: u32, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            word_count: text.split_whitespace().count(),
            text,
            pages: pages.max(1),
            confidence,
        }
    }
}

/// A document that has been extracted and stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Per-session identifier, e.g. `DOC001`
    pub short_id: String,
    /// Owning session scope
    pub session_id: String,
    /// Extracted text
    pub text: String,
    /// Page count
    pub page_count: u32,
    /// Extraction confidence in [0, 1]
    pub confidence: f32,
    /// Whitespace-delimited token count
    pub word_count: usize,
}

impl DocumentRecord {
    /// Build a record from an extraction result
    pub fn from_extraction(session: &SessionScope, short_id: String, result: ExtractionResult) -> Self {
        Self {
            short_id,
            session_id: session.as_str().to_string(),
            text: result.text,
            page_count: result.pages,
            confidence: result.confidence,
            word_count: result.word_count,
        }
    }

    /// Global storage key: `<session>_<short_id>`
    pub fn composite_id(&self) -> String {
        composite_id(&self.session_id, &self.short_id)
    }

    /// Knowledge-store metadata for this record
    pub fn metadata(&self) -> Metadata {
        let value = json!({
            "pages": self.page_count,
            "confidence": self.confidence,
            "word_count": self.word_count,
            "timestamp": self.session_id,
            "doc_id": self.short_id,
        });
        match value {
            serde_json::Value::Object(map) => map,
            _ => Metadata::new(),
        }
    }
}

/// Join a session scope and a short id into a storage key
pub fn composite_id(session: &str, short_id: &str) -> String {
    format!("{}_{}", session, short_id)
}
