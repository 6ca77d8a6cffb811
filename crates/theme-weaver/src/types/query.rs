//! Request types

use serde::{Deserialize, Serialize};

/// Query string for `GET /api/query/query_documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// The user's question
    pub q: String,
    /// Session scope to query
    pub timestamp: String,
}

/// Query string for `GET /api/documents`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Restrict to one session
    #[serde(default)]
    pub session: Option<String>,
}

/// Query string for `GET /api/documents/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Search text
    pub q: String,
    /// Maximum number of hits
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

fn default_n_results() -> usize {
    5
}

/// Body of `POST /api/themes/analyze`
///
/// Either inline texts (with optional ids) or a session whose stored
/// documents should be analyzed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeRequest {
    /// Inline document texts
    #[serde(default)]
    pub document_texts: Vec<String>,
    /// Ids for `document_texts`; positional `Document N` labels when absent
    #[serde(default)]
    pub document_ids: Vec<String>,
    /// Analyze every stored document of this session instead
    #[serde(default)]
    pub session: Option<String>,
}
