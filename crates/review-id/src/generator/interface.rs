use std::sync::Arc;

use crate::id::SnowflakeId;

/// A minimal interface for minting Snowflake IDs.
///
/// Business logic that creates reviews, replies or appeals should depend on
/// this trait (usually as `Arc<dyn IdGenerator>`) rather than on a concrete
/// generator, so tests can substitute a deterministic one.
pub trait IdGenerator: Send + Sync {
    /// Returns the next ID. Never fails; may spin for up to a millisecond
    /// when the sequence for the current tick is exhausted.
    fn next_id(&self) -> SnowflakeId;

    /// Mints `count` IDs in order.
    fn next_ids(&self, count: usize) -> Vec<SnowflakeId> {
        (0..count).map(|_| self.next_id()).collect()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for Arc<G> {
    fn next_id(&self) -> SnowflakeId {
        (**self).next_id()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn next_id(&self) -> SnowflakeId {
        (**self).next_id()
    }
}
