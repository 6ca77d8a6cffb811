//! Per-session short document ids (`DOC001`, `DOC002`, ...)
//!
//! Each session folder holds a `counter.txt` with the next ordinal to hand
//! out. Allocation for one session is serialized through an async mutex so
//! concurrent uploads never observe the same value.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::SessionScope;

/// Name of the counter file inside a session folder
pub const COUNTER_FILE: &str = "counter.txt";

/// Format an ordinal as a short id, zero-padded to three digits
pub fn format_short_id(ordinal: u64) -> String {
    format!("DOC{:03}", ordinal)
}

/// Location of one persisted counter
#[derive(Debug, Clone)]
pub struct CounterHandle {
    key: String,
    path: PathBuf,
}

impl CounterHandle {
    /// Counter for an arbitrary key/path pair
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    /// Counter stored in `<data_dir>/<session>/counter.txt`
    pub fn for_session(data_dir: &Path, session: &SessionScope) -> Self {
        Self::new(
            session.as_str(),
            data_dir.join(session.as_str()).join(COUNTER_FILE),
        )
    }

    /// Serialization key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Counter file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Hands out short ids, one async lock per counter key
///
/// Locks are created on first use and kept for the life of the allocator,
/// so the map grows by one entry per session seen and never shrinks.
#[derive(Debug, Default)]
pub struct SessionIdAllocator {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionIdAllocator {
    /// Create an allocator
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().clone()
    }

    /// Allocate the next short id for a counter.
    ///
    /// A missing counter starts the sequence at 1. The incremented value is
    /// persisted before the id is returned.
    pub async fn next(&self, counter: &CounterHandle) -> Result<String> {
        let lock = self.lock_for(counter.key());
        let _guard = lock.lock().await;

        let ordinal = read_counter(counter.path()).await?.unwrap_or(1);
        let following = ordinal.checked_add(1).ok_or_else(|| Error::CounterCorrupt {
            path: counter.path().to_path_buf(),
            value: ordinal.to_string(),
        })?;
        write_counter(counter.path(), following).await?;

        tracing::debug!("Allocated {} for '{}'", format_short_id(ordinal), counter.key());
        Ok(format_short_id(ordinal))
    }
}

async fn read_counter(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| Error::CounterCorrupt {
                path: path.to_path_buf(),
                value: raw,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write through a sibling temp file and rename so readers never see a
/// partially written counter.
async fn write_counter(path: &Path, value: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp, value.to_string()).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
