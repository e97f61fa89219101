//! Error types for the review read path.
//!
//! Every error here is `Clone`: one upstream failure is handed to every
//! caller that was coalesced onto the same fetch.
//!
//! ## Error Cases
//! - [`KeyError`]: a cache key could not be built or parsed.
//! - [`StoreError`]: an adapter (cache or search) reported a fault.
//! - [`PageError`]: what a page fetch returns to its caller.

use thiserror::Error;

use crate::flight::FlightError;

/// A cache key could not be built or parsed.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("cache key namespace is empty")]
    EmptyNamespace,

    /// The namespace contains the field delimiter, which would make the
    /// textual key ambiguous.
    #[error("cache key namespace {namespace:?} contains ':'")]
    DelimiterInNamespace { namespace: String },

    #[error("cache key {key:?} has {found} fields, expected 4")]
    FieldCount { key: String, found: usize },

    #[error("cache key field `{field}` is not a valid number: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// A fault reported by a cache store or search backend.
///
/// Adapters wrap whatever their client library returns into a message; the
/// read path only needs to know that the call failed and why.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of a page fetch.
#[derive(Error, Clone, Debug)]
pub enum PageError {
    #[error("invalid cache key: {0}")]
    Key(#[from] KeyError),

    /// The cache store failed with something other than a miss. The search
    /// backend is not queried in this case.
    #[error("cache lookup for {key} failed: {source}")]
    Cache {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("search query for {key} failed: {source}")]
    Backend {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The payload for the key is not a result set at all. Single bad
    /// documents never produce this; they are skipped.
    #[error("result set for {key} is corrupt: {message}")]
    Decode { key: String, message: String },

    #[error("result set for {key} could not be encoded: {message}")]
    Encode { key: String, message: String },

    #[error(transparent)]
    Flight(#[from] FlightError),
}
