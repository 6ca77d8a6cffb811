//! Knowledge store trait for documents and themes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Flat JSON metadata attached to a record
pub type Metadata = serde_json::Map<String, Value>;

/// A stored text with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Unique record id
    pub id: String,
    /// Record text
    pub text: String,
    /// Record metadata
    #[serde(default)]
    pub metadata: Metadata,
}

/// A query hit
#[derive(Debug, Clone)]
pub struct StoreMatch {
    /// Matching record
    pub record: StoreRecord,
    /// Relevance score in [0, 1]
    pub score: f32,
}

/// Conjunction of metadata equality and presence predicates
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    equals: Metadata,
    present: Vec<String>,
}

impl MetadataFilter {
    /// Filter matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    /// Require `key` to be present with any value
    pub fn has(mut self, key: impl Into<String>) -> Self {
        self.present.push(key.into());
        self
    }

    /// Check a record's metadata against every predicate
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.present.iter().all(|key| metadata.contains_key(key))
            && self
                .equals
                .iter()
                .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// Persistent store of texts with metadata
///
/// Implementations:
/// - `LocalKnowledgeStore`: in-memory map persisted as JSON
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert or replace a record
    async fn put(&self, id: &str, text: &str, metadata: Metadata) -> Result<()>;

    /// Records most relevant to `text`, best first
    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoreMatch>>;

    /// Records whose metadata matches, in insertion order
    async fn get_where(&self, filter: &MetadataFilter) -> Result<Vec<StoreRecord>>;

    /// Fetch one record
    async fn get(&self, id: &str) -> Result<Option<StoreRecord>>;

    /// Delete records, returning how many existed
    async fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Number of stored records
    async fn len(&self) -> Result<usize>;

    /// Get store name for logging
    fn name(&self) -> &str;
}
