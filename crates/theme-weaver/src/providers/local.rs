//! Local knowledge store: in-memory records persisted to a JSON file

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

use super::knowledge_store::{KnowledgeStore, Metadata, MetadataFilter, StoreMatch, StoreRecord};

struct Entry {
    seq: u64,
    record: StoreRecord,
}

#[derive(Default)]
struct Records {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl Records {
    fn ordered(&self) -> Vec<&StoreRecord> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| &e.record).collect()
    }
}

/// Knowledge store backed by a JSON file
pub struct LocalKnowledgeStore {
    storage_path: Option<PathBuf>,
    records: RwLock<Records>,
    save_lock: Mutex<()>,
}

impl LocalKnowledgeStore {
    /// Open a store, loading existing records from `storage_path`
    pub fn open(storage_path: impl Into<PathBuf>) -> Result<Self> {
        let storage_path = storage_path.into();
        let store = Self {
            storage_path: Some(storage_path.clone()),
            records: RwLock::new(Records::default()),
            save_lock: Mutex::new(()),
        };
        store.load(&storage_path)?;
        Ok(store)
    }

    /// Store that lives only in memory
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self {
            storage_path: None,
            records: RwLock::new(Records::default()),
            save_lock: Mutex::new(()),
        }
    }

    fn load(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let data = std::fs::read_to_string(path)?;
        let loaded: Vec<StoreRecord> = serde_json::from_str(&data)
            .map_err(|e| Error::store(format!("Failed to parse {}: {}", path.display(), e)))?;

        let mut guard = self.records.write();
        let records = &mut *guard;
        for record in loaded {
            let seq = records.next_seq;
            records.next_seq += 1;
            records.entries.insert(record.id.clone(), Entry { seq, record });
        }

        tracing::info!("Loaded {} records from {}", records.entries.len(), path.display());
        Ok(())
    }

    /// Write the current snapshot through a temp file
    async fn save(&self) -> Result<()> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };

        let _guard = self.save_lock.lock().await;
        let data = {
            let records = self.records.read();
            serde_json::to_string_pretty(&records.ordered())?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Lowercased alphanumeric terms longer than two characters
fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|s| s.to_string())
        .collect()
}

#[async_trait]
impl KnowledgeStore for LocalKnowledgeStore {
    async fn put(&self, id: &str, text: &str, metadata: Metadata) -> Result<()> {
        {
            let mut guard = self.records.write();
            let records = &mut *guard;
            let record = StoreRecord {
                id: id.to_string(),
                text: text.to_string(),
                metadata,
            };
            match records.entries.get_mut(id) {
                Some(existing) => existing.record = record,
                None => {
                    let seq = records.next_seq;
                    records.next_seq += 1;
                    records.entries.insert(id.to_string(), Entry { seq, record });
                }
            }
        }
        self.save().await
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoreMatch>> {
        let query_terms = terms(text);
        if query_terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let records = self.records.read();
        let mut matches: Vec<StoreMatch> = records
            .ordered()
            .into_iter()
            .filter_map(|record| {
                let record_terms = terms(&record.text);
                let overlap = query_terms.intersection(&record_terms).count();
                (overlap > 0).then(|| StoreMatch {
                    record: record.clone(),
                    score: overlap as f32 / query_terms.len() as f32,
                })
            })
            .collect();

        // stable sort keeps insertion order among ties
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);
        Ok(matches)
    }

    async fn get_where(&self, filter: &MetadataFilter) -> Result<Vec<StoreRecord>> {
        let records = self.records.read();
        Ok(records
            .ordered()
            .into_iter()
            .filter(|r| filter.matches(&r.metadata))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<StoreRecord>> {
        Ok(self.records.read().entries.get(id).map(|e| e.record.clone()))
    }

    async fn delete(&self, ids: &[String]) -> Result<usize> {
        let removed = {
            let mut records = self.records.write();
            ids.iter()
                .filter(|id| records.entries.remove(id.as_str()).is_some())
                .count()
        };
        if removed > 0 {
            self.save().await?;
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().entries.len())
    }

    fn name(&self) -> &str {
        "local-json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_put_overwrites_and_keeps_order() {
        let store = LocalKnowledgeStore::in_memory();
        store.put("a", "first", meta(json!({"doc_id": "DOC001"}))).await.unwrap();
        store.put("b", "second", meta(json!({"doc_id": "DOC002"}))).await.unwrap();
        store.put("a", "replaced", meta(json!({"doc_id": "DOC001"}))).await.unwrap();

        let all = store.get_where(&MetadataFilter::new()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].text, "replaced");
        assert_eq!(all[1].id, "b");
    }

    #[tokio::test]
    async fn test_get_where_filters_by_session() {
        let store = LocalKnowledgeStore::in_memory();
        store.put("s1_DOC001", "x", meta(json!({"timestamp": "s1"}))).await.unwrap();
        store.put("s2_DOC001", "y", meta(json!({"timestamp": "s2"}))).await.unwrap();
        store.put("s1_DOC002", "z", meta(json!({"timestamp": "s1"}))).await.unwrap();

        let filter = MetadataFilter::new().eq("timestamp", "s1");
        let ids: Vec<String> = store
            .get_where(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["s1_DOC001", "s1_DOC002"]);
    }

    #[tokio::test]
    async fn test_query_ranks_by_term_overlap() {
        let store = LocalKnowledgeStore::in_memory();
        store.put("a", "supply chain delays in shipping", Metadata::new()).await.unwrap();
        store.put("b", "shipping costs", Metadata::new()).await.unwrap();
        store.put("c", "unrelated text", Metadata::new()).await.unwrap();

        let hits = store.query("shipping delays", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.id, "a");
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[1].record.id, "b");
    }

    #[tokio::test]
    async fn test_delete_counts_existing() {
        let store = LocalKnowledgeStore::in_memory();
        store.put("a", "x", Metadata::new()).await.unwrap();

        let removed = store
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = LocalKnowledgeStore::open(&path).unwrap();
            store.put("one", "alpha", meta(json!({"k": 1}))).await.unwrap();
            store.put("two", "beta", Metadata::new()).await.unwrap();
        }

        let reopened = LocalKnowledgeStore::open(&path).unwrap();
        let record = reopened.get("one").await.unwrap().unwrap();
        assert_eq!(record.text, "alpha");
        assert_eq!(record.metadata["k"], 1);

        let all = reopened.get_where(&MetadataFilter::new()).await.unwrap();
        assert_eq!(all[0].id, "one");
        assert_eq!(all[1].id, "two");
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(LocalKnowledgeStore::open(&path), Err(Error::Store(_))));
    }
}
