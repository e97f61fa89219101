//! The coalescing read-through path.
//!
//! [`PageReader::fetch_page`] turns `(partition, offset, limit)` into a
//! [`CacheKey`] and joins the in-flight group for it. The group's leader
//! loads the page (cache first, search backend on a miss) and publishes the
//! encoded result set. Every caller then decodes the shared payload on its
//! own, dropping documents that do not fit `R`.

mod config;
mod stats;


pub use config::*;
pub use stats::*;

use std::{marker::PhantomData, sync::Arc};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    error::PageError,
    flight::{Flight, FlightGroup, Resolver},
    key::CacheKey,
    result_set::ResultSet,
    store::{CacheStore, EqualityFilter, SearchBackend, SearchRequest},
};

/// Where a loaded payload came from.
enum Loaded {
    Cached(Bytes),
    Fresh(Bytes),
}

struct Shared {
    cache: Arc<dyn CacheStore>,
    search: Arc<dyn SearchBackend>,
    config: PageReaderConfig,
    stats: ReadStats,
}

impl Shared {
    /// Leader side of a flight: load, publish, then write back.
    async fn run(&self, key: CacheKey, resolver: Resolver<Bytes, PageError>) {
        let rendered = key.to_string();
        match self.load(&key, &rendered).await {
            Ok(Loaded::Cached(payload)) => resolver.resolve(Ok(payload)),
            Ok(Loaded::Fresh(payload)) => {
                resolver.resolve(Ok(payload.clone()));
                if let Err(error) = self.cache.set(&rendered, payload, self.config.ttl).await {
                    self.stats.record_cache_write_failure();
                    tracing::warn!(key = %rendered, %error, "cache write failed, result served uncached");
                }
            }
            Err(error) => resolver.resolve(Err(error)),
        }
    }

    async fn load(&self, key: &CacheKey, rendered: &str) -> Result<Loaded, PageError> {
        match self.cache.get(rendered).await {
            Ok(Some(payload)) => {
                self.stats.record_cache_hit();
                tracing::debug!("cache hit");
                return Ok(Loaded::Cached(payload));
            }
            Ok(None) => {
                self.stats.record_cache_miss();
                tracing::debug!("cache miss");
            }
            Err(source) => {
                tracing::warn!(error = %source, "cache lookup failed, backend not queried");
                return Err(PageError::Cache {
                    key: rendered.to_string(),
                    source,
                });
            }
        }

        let request = SearchRequest {
            index: self.config.index.clone(),
            filter: EqualityFilter::new(
                self.config.partition_field.as_str(),
                key.partition().to_string(),
            ),
            offset: key.offset(),
            limit: key.limit(),
        };
        self.stats.record_backend_query();
        let results = self
            .search
            .query(&request)
            .await
            .map_err(|source| PageError::Backend {
                key: rendered.to_string(),
                source,
            })?;
        tracing::debug!(total = results.total, returned = results.documents.len(), "backend answered");

        let payload = results.encode().map_err(|err| PageError::Encode {
            key: rendered.to_string(),
            message: err.to_string(),
        })?;
        Ok(Loaded::Fresh(payload))
    }
}

/// Coalescing read-through reader of paginated, partitioned documents.
///
/// Cloning is cheap; clones share the cache, backend, counters and in-flight
/// registry, so concurrent fetches through any clone coalesce.
pub struct PageReader<R> {
    shared: Arc<Shared>,
    flights: FlightGroup<CacheKey, Bytes, PageError>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PageReader<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            flights: self.flights.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> PageReader<R>
where
    R: DeserializeOwned,
{
    pub fn new(
        cache: Arc<dyn CacheStore>,
        search: Arc<dyn SearchBackend>,
        config: PageReaderConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache,
                search,
                config,
                stats: ReadStats::default(),
            }),
            flights: FlightGroup::new(),
            _record: PhantomData,
        }
    }

    pub fn config(&self) -> &PageReaderConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> &ReadStats {
        &self.shared.stats
    }

    /// Number of pages currently being loaded.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Fetches one page of `partition`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`PageError::Key`] if the configured namespace is not a valid key
    ///   field.
    /// - [`PageError::Cache`] if the cache store faulted; the backend is not
    ///   queried.
    /// - [`PageError::Backend`] if the search query failed.
    /// - [`PageError::Decode`] if the payload is not a result set.
    /// - [`PageError::Flight`] if the load was abandoned.
    ///
    /// Documents that do not deserialize into `R` are skipped, not reported.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_page(
        &self,
        partition: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<R>, PageError> {
        let (key, flight) = self.join(partition, offset, limit)?;
        let payload = flight.wait().await?;
        self.decode(&key, &payload)
    }

    /// Like [`fetch_page`](Self::fetch_page), but stops waiting with
    /// [`FlightError::Cancelled`](crate::FlightError::Cancelled) once
    /// `cancel` fires. The load keeps running for other callers and still
    /// populates the cache.
    #[tracing::instrument(level = "debug", skip(self, cancel))]
    pub async fn fetch_page_cancellable(
        &self,
        partition: i64,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<R>, PageError> {
        let (key, flight) = self.join(partition, offset, limit)?;
        let payload = flight.wait_or_cancel(cancel).await?;
        self.decode(&key, &payload)
    }

    fn join(
        &self,
        partition: i64,
        offset: u32,
        limit: u32,
    ) -> Result<(CacheKey, Flight<Bytes, PageError>), PageError> {
        let key = CacheKey::new(self.shared.config.namespace.as_str(), partition, offset, limit)?;

        let shared = Arc::clone(&self.shared);
        let load_key = key.clone();
        let flight = self.flights.join(key.clone(), move |resolver| {
            let span = tracing::debug_span!("load_page", key = %load_key);
            async move { shared.run(load_key, resolver).await }.instrument(span)
        });
        if !flight.is_leader() {
            self.shared.stats.record_coalesced_wait();
        }
        Ok((key, flight))
    }

    fn decode(&self, key: &CacheKey, payload: &[u8]) -> Result<Vec<R>, PageError> {
        let set = ResultSet::decode(payload).map_err(|err| PageError::Decode {
            key: key.to_string(),
            message: err.to_string(),
        })?;

        let mut records = Vec::with_capacity(set.documents.len());
        for (position, document) in set.documents.into_iter().enumerate() {
            match serde_json::from_value::<R>(document) {
                Ok(record) => records.push(record),
                Err(error) => {
                    self.shared.stats.record_decode_failure();
                    tracing::warn!(%key, position, %error, "skipping malformed document");
                }
            }
        }
        Ok(records)
    }
}
