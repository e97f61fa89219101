use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StoreError, result_set::ResultSet};

/// Key/value cache with expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks a key up.
    ///
    /// Returns `Ok(None)` when the key is absent or expired. `Err` is reserved
    /// for faults (connection loss, timeouts); the read path does not fall
    /// back to the search backend on `Err`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Stores `value` under `key` for `ttl`. Last writer wins.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;
}

/// Paginated query interface over indexed documents.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs `request`, returning one page of matching documents and the total
    /// match count. Retries, if any, belong to the implementation.
    async fn query(&self, request: &SearchRequest) -> Result<ResultSet, StoreError>;
}

/// Matches documents whose `field` equals `value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: String,
}

impl EqualityFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub index: String,
    pub filter: EqualityFilter,
    pub offset: u32,
    pub limit: u32,
}
