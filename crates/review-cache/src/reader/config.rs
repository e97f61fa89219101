use std::time::Duration;

/// Default namespace, search index and TTL of the review listing.
pub const DEFAULT_NAMESPACE: &str = "review";
pub const DEFAULT_INDEX: &str = "review";
pub const DEFAULT_PARTITION_FIELD: &str = "store_id";
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Settings of a [`PageReader`](super::PageReader).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageReaderConfig {
    /// First field of every cache key. Must be non-empty and free of `:`.
    pub namespace: String,
    /// Search index queried on a cache miss.
    pub index: String,
    /// Document field the partition ID is matched against.
    pub partition_field: String,
    /// Expiry of entries written back after a miss.
    pub ttl: Duration,
}

impl Default for PageReaderConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            index: DEFAULT_INDEX.to_string(),
            partition_field: DEFAULT_PARTITION_FIELD.to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

impl PageReaderConfig {
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    #[must_use]
    pub fn with_partition_field(mut self, field: impl Into<String>) -> Self {
        self.partition_field = field.into();
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}
