//! # `review-cache`: coalescing read path for review listings
//!
//! "List the reviews of store N, page K" is the hottest read on the platform
//! and every uncached page costs a search-index query. This crate puts a
//! read-through cache in front of the index and collapses concurrent misses
//! for the same page into a single upstream query, so a burst of identical
//! requests (a popular store, a cold cache after a deploy) reaches the index
//! once instead of once per caller.
//!
//! ## Flow
//!
//! 1. Build a [`CacheKey`] `namespace:partition:offset:limit`.
//! 2. Join the in-flight group for that key ([`FlightGroup`]). The first
//!    caller spawns the load, everyone else waits for its outcome.
//! 3. The load consults the [`CacheStore`]. A hit is returned as is, a miss
//!    queries the [`SearchBackend`], a cache fault fails the whole group.
//! 4. Fresh results are published to the waiters and then written back with
//!    a TTL. A failed write is logged, never surfaced.
//! 5. Each caller decodes the shared payload into its record type, skipping
//!    documents that do not parse.
//!
//! ## Modules
//!
//! - [`key`] - cache key construction and parsing.
//! - [`result_set`] - the cached payload format.
//! - [`store`] - cache and search adapter traits plus in-memory adapters.
//! - [`flight`] - the in-flight request registry.
//! - [`reader`] - the read path itself.
//! - [`record`] - the review document model and the store listing façade.

pub mod error;
pub mod flight;
pub mod key;
pub mod reader;
pub mod record;
pub mod result_set;
pub mod store;

pub use error::{KeyError, PageError, StoreError};
pub use flight::{Flight, FlightError, FlightGroup, Resolver, Role};
pub use key::CacheKey;
pub use reader::{PageReader, PageReaderConfig, ReadStats, ReadStatsSnapshot};
pub use record::{ReviewLister, ReviewRecord};
pub use result_set::ResultSet;
pub use store::{
    CacheStore, EqualityFilter, MemoryCacheStore, MemorySearchBackend, SearchBackend,
    SearchRequest,
};
