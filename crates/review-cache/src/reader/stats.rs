use portable_atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Counters of a [`PageReader`](super::PageReader).
///
/// Cache and backend counters are bumped once per flight; `coalesced_waits`
/// and `decode_failures` once per caller.
#[derive(Debug, Default)]
pub struct ReadStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    backend_queries: AtomicU64,
    coalesced_waits: AtomicU64,
    cache_write_failures: AtomicU64,
    decode_failures: AtomicU64,
}

macro_rules! counters {
    ($($name:ident => $record:ident),* $(,)?) => {
        impl ReadStats {
            $(
                pub fn $name(&self) -> u64 {
                    self.$name.load(Ordering::Relaxed)
                }

                pub(crate) fn $record(&self) {
                    self.$name.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> ReadStatsSnapshot {
                ReadStatsSnapshot {
                    $($name: self.$name(),)*
                }
            }
        }
    };
}

counters! {
    cache_hits => record_cache_hit,
    cache_misses => record_cache_miss,
    backend_queries => record_backend_query,
    coalesced_waits => record_coalesced_wait,
    cache_write_failures => record_cache_write_failure,
    decode_failures => record_decode_failure,
}

/// Point-in-time copy of [`ReadStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReadStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub backend_queries: u64,
    pub coalesced_waits: u64,
    pub cache_write_failures: u64,
    pub decode_failures: u64,
}
