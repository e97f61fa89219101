//! The payload stored under a cache key.
//!
//! Search results are cached as JSON exactly as the backend produced them.
//! Documents stay opaque [`serde_json::Value`]s until a caller decodes them
//! into its own record type, so the cached representation does not change
//! when a record type gains or loses fields.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Number of documents matching the filter, across all pages.
    pub total: u64,
    /// The documents of this page, in backend order.
    pub documents: Vec<Value>,
}

impl ResultSet {
    pub fn new(total: u64, documents: Vec<Value>) -> Self {
        Self { total, documents }
    }

    /// Serializes the set for the cache.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; plain JSON values do not fail in
    /// practice.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    /// Parses a cached payload.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not a result set. Documents inside a valid
    /// set are not inspected here.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
