use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::time::Instant;

use crate::{
    error::StoreError,
    result_set::ResultSet,
    store::{CacheStore, SearchBackend, SearchRequest},
};

struct CacheEntry {
    value: Bytes,
    /// `None` when the TTL is too large to represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Process-local [`CacheStore`].
///
/// Expiry uses [`tokio::time::Instant`], so paused test runtimes can advance
/// past a TTL without sleeping. Expired entries are dropped lazily on lookup
/// or in bulk through [`MemoryCacheStore::purge_expired`].
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }
}

/// Process-local [`SearchBackend`] holding JSON documents per index.
///
/// The equality filter compares field values textually: the production index
/// stores integer columns as decimal strings, so a filter value of `"7"`
/// matches both `7` and `"7"`.
#[derive(Default)]
pub struct MemorySearchBackend {
    indices: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, index: &str, document: Value) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .push(document);
    }

    pub fn extend(&self, index: &str, documents: impl IntoIterator<Item = Value>) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .extend(documents);
    }

    /// Number of documents stored in `index`.
    pub fn len(&self, index: &str) -> usize {
        self.indices.read().get(index).map_or(0, Vec::len)
    }
}

fn field_matches(document: &Value, field: &str, expected: &str) -> bool {
    match document.get(field) {
        Some(Value::String(actual)) => actual == expected,
        Some(actual @ (Value::Number(_) | Value::Bool(_))) => actual.to_string() == expected,
        _ => false,
    }
}

#[async_trait]
impl SearchBackend for MemorySearchBackend {
    async fn query(&self, request: &SearchRequest) -> Result<ResultSet, StoreError> {
        let indices = self.indices.read();
        let Some(documents) = indices.get(&request.index) else {
            return Err(StoreError::new(format!(
                "no such index: {}",
                request.index
            )));
        };

        let matching: Vec<&Value> = documents
            .iter()
            .filter(|doc| field_matches(doc, &request.filter.field, &request.filter.value))
            .collect();

        let page = matching
            .iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .map(|doc| (*doc).clone())
            .collect();

        Ok(ResultSet::new(matching.len() as u64, page))
    }
}
