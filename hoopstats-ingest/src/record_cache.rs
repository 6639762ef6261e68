//! Record Cache
//!
//! Session store for fetched records, keyed by (identifier, record kind),
//! backed by one JSON file per key so offline runs can reuse earlier fetches.
//!
//! - A put replaces the whole entry: the file is written to a temp path and
//!   renamed over the target while the write lock is held.
//! - A get that misses memory falls back to disk.
//! - [`RecordCache::remember`] keeps an entry in memory without writing it.
//! - There is no eviction; growth is bounded by the identifiers seen.

use crate::error::CacheError;
use crate::types::{CanonicalRecord, StatSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const RAW_SUBDIR: &str = "raw";

/// Kind of cached payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Record,
    Series,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Record => "record",
            RecordKind::Series => "series",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachePayload {
    Record(CanonicalRecord),
    Series(StatSeries),
}

impl CachePayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            CachePayload::Record(_) => RecordKind::Record,
            CachePayload::Series(_) => RecordKind::Series,
        }
    }
}

/// One stored payload; replaced wholesale, never mutated in place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identifier: String,
    pub record_kind: RecordKind,
    pub payload: CachePayload,
    pub stored_at: DateTime<Utc>,
}

type CacheKey = (String, RecordKind);

pub struct RecordCache {
    directory: Option<PathBuf>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl RecordCache {
    /// Cache persisted under `directory` (created on first write)
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache that never touches disk
    pub fn in_memory() -> Self {
        Self {
            directory: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// File backing `(identifier, kind)`, if the cache is persistent
    pub fn entry_path(&self, identifier: &str, kind: RecordKind) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| {
            dir.join(format!(
                "player_{}_{}.json",
                file_component(identifier),
                kind.as_str()
            ))
        })
    }

    /// Look up an entry; `None` is a miss
    pub async fn get(&self, identifier: &str, kind: RecordKind) -> Option<CacheEntry> {
        let key = (identifier.to_string(), kind);

        if let Some(entry) = self.entries.read().await.get(&key) {
            debug!(identifier = %identifier, kind = kind.as_str(), "Cache hit (memory)");
            return Some(entry.clone());
        }

        let entry = self.load_from_disk(identifier, kind).await?;

        let mut entries = self.entries.write().await;
        // A concurrent put may have landed while the file was read
        let entry = entries.entry(key).or_insert(entry).clone();
        debug!(identifier = %identifier, kind = kind.as_str(), "Cache hit (disk)");
        Some(entry)
    }

    /// Store `payload`, replacing any existing entry for the key
    pub async fn put(
        &self,
        identifier: &str,
        kind: RecordKind,
        payload: CachePayload,
    ) -> Result<CacheEntry, CacheError> {
        let entry = new_entry(identifier, kind, payload)?;

        // Held across the file write so writers to one key are serialized
        let mut entries = self.entries.write().await;

        if let Some(path) = self.entry_path(identifier, kind) {
            let json = serde_json::to_vec_pretty(&entry)?;
            write_atomic(&path, &json).await?;
            debug!(path = %path.display(), "Cache entry written");
        }

        entries.insert((identifier.to_string(), kind), entry.clone());
        Ok(entry)
    }

    /// Store `payload` for this process only
    ///
    /// The backing file is left untouched, so a later process fetches again.
    pub async fn remember(
        &self,
        identifier: &str,
        kind: RecordKind,
        payload: CachePayload,
    ) -> Result<CacheEntry, CacheError> {
        let entry = new_entry(identifier, kind, payload)?;
        self.entries
            .write()
            .await
            .insert((identifier.to_string(), kind), entry.clone());
        debug!(identifier = %identifier, kind = kind.as_str(), "Cache entry held in memory only");
        Ok(entry)
    }

    /// Keep an unmodified upstream payload for audit. Never read back.
    ///
    /// No-op for in-memory caches.
    pub async fn put_raw(&self, identifier: &str, label: &str, body: &[u8]) -> Result<(), CacheError> {
        let Some(dir) = &self.directory else {
            return Ok(());
        };

        let path = dir.join(RAW_SUBDIR).join(format!(
            "player_{}_{}",
            file_component(identifier),
            file_component(label)
        ));
        write_atomic(&path, body).await?;
        debug!(path = %path.display(), "Raw payload persisted");
        Ok(())
    }

    /// Number of entries held in memory
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn load_from_disk(&self, identifier: &str, kind: RecordKind) -> Option<CacheEntry> {
        let path = self.entry_path(identifier, kind)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file unreadable, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.identifier == identifier && entry.record_kind == kind => Some(entry),
            Ok(_) => {
                warn!(path = %path.display(), "Cache file holds a different key, treating as miss");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file corrupt, treating as miss");
                None
            }
        }
    }
}

fn new_entry(
    identifier: &str,
    kind: RecordKind,
    payload: CachePayload,
) -> Result<CacheEntry, CacheError> {
    if payload.kind() != kind {
        return Err(CacheError::KindMismatch {
            requested: kind.as_str(),
            actual: payload.kind().as_str(),
        });
    }

    Ok(CacheEntry {
        identifier: identifier.to_string(),
        record_kind: kind,
        payload,
        stored_at: Utc::now(),
    })
}

/// Write to `<path>.tmp` then rename over `path`
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Percent-encode a key for use inside a file name
///
/// Only `[A-Za-z0-9-_.~]` pass through, so distinct keys never share a file
/// and no separator survives.
fn file_component(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}
