use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use portable_atomic::{AtomicUsize, Ordering};
use review_cache::{
    CacheStore, FlightError, MemoryCacheStore, MemorySearchBackend, PageError, PageReader,
    ResultSet, ReviewLister, ReviewRecord, SearchBackend, SearchRequest, StoreError,
};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

fn review(review_id: i64, store_id: i64) -> Value {
    json!({
        "id": review_id.to_string(),
        "review_id": review_id.to_string(),
        "store_id": store_id.to_string(),
        "user_id": "42",
        "score": "5",
        "content": format!("review {review_id}"),
        "status": "20",
        "create_at": "2024-05-01 12:30:00",
        "update_at": "2024-05-01 12:30:00"
    })
}

/// Counts queries and, when gated, holds each one until a permit is added.
struct CountingBackend {
    inner: MemorySearchBackend,
    queries: AtomicUsize,
    gate: Option<Semaphore>,
}

impl CountingBackend {
    fn open() -> Self {
        Self {
            inner: MemorySearchBackend::new(),
            queries: AtomicUsize::new(0),
            gate: None,
        }
    }

    fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::open()
        }
    }

    fn with_store(self, store_id: i64, count: i64) -> Self {
        self.inner
            .extend("review", (0..count).map(|n| review(store_id * 1000 + n, store_id)));
        self
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(Semaphore::MAX_PERMITS >> 1);
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for CountingBackend {
    async fn query(&self, request: &SearchRequest) -> Result<ResultSet, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|err| StoreError::new(err.to_string()))?;
        }
        self.inner.query(request).await
    }
}

struct FailingBackend;

#[async_trait]
impl SearchBackend for FailingBackend {
    async fn query(&self, _request: &SearchRequest) -> Result<ResultSet, StoreError> {
        Err(StoreError::new("index unavailable"))
    }
}

/// A cache whose lookups fault.
struct FaultyCache;

#[async_trait]
impl CacheStore for FaultyCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Err(StoreError::new("connection reset"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A cache that always misses and refuses writes.
struct ReadOnlyCache;

#[async_trait]
impl CacheStore for ReadOnlyCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::new("READONLY replica"))
    }
}

async fn settle(reader: &PageReader<ReviewRecord>) {
    while reader.in_flight() > 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_fetches_query_backend_once() {
    const CALLERS: usize = 32;

    let backend = Arc::new(CountingBackend::gated().with_store(7, 12));
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), backend.clone());

    let calls: Vec<_> = (0..CALLERS)
        .map(|_| {
            let lister = lister.clone();
            tokio::spawn(async move { lister.list_by_store(7, 0, 10).await })
        })
        .collect();

    let stats_lister = lister.clone();
    wait_until(move || stats_lister.reader().stats().coalesced_waits() == CALLERS as u64 - 1)
        .await;
    backend.release();

    let pages: Vec<Vec<ReviewRecord>> = join_all(calls)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(backend.queries(), 1);
    assert_eq!(pages[0].len(), 10);
    assert!(pages.iter().all(|page| page == &pages[0]));

    let stats = lister.reader().stats().snapshot();
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.backend_queries, 1);
    assert_eq!(stats.coalesced_waits, CALLERS as u64 - 1);
}

#[tokio::test]
async fn cache_hit_never_touches_backend() {
    let cache = Arc::new(MemoryCacheStore::new());
    let cached = ResultSet::new(1, vec![review(1, 9)]);
    cache
        .set("review:9:0:10", cached.encode().unwrap(), Duration::from_secs(300))
        .await
        .unwrap();

    let backend = Arc::new(CountingBackend::open().with_store(9, 5));
    let lister = ReviewLister::new(cache, backend.clone());

    let page = lister.list_by_store(9, 0, 10).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].review_id, 1);
    assert_eq!(backend.queries(), 0);
    assert_eq!(lister.reader().stats().cache_hits(), 1);
}

#[tokio::test]
async fn different_stores_are_independent() {
    let cache = Arc::new(MemoryCacheStore::new());
    let backend = Arc::new(CountingBackend::open().with_store(1, 3).with_store(2, 4));
    let lister = ReviewLister::new(cache.clone(), backend.clone());

    let (a, b) = tokio::join!(lister.list_by_store(1, 0, 10), lister.list_by_store(2, 0, 10));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.len(), 3);
    assert!(a.iter().all(|record| record.store_id == 1));
    assert_eq!(b.len(), 4);
    assert!(b.iter().all(|record| record.store_id == 2));
    assert_eq!(backend.queries(), 2);

    settle(lister.reader()).await;
    assert_eq!(cache.len(), 2);
    assert!(cache.get("review:1:0:10").await.unwrap().is_some());
    assert!(cache.get("review:2:0:10").await.unwrap().is_some());
}

#[tokio::test]
async fn pages_of_the_same_store_are_independent() {
    let backend = Arc::new(CountingBackend::open().with_store(3, 25));
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), backend.clone());

    let first = lister.list_by_store(3, 0, 10).await.unwrap();
    let third = lister.list_by_store(3, 20, 10).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(third.len(), 5);
    assert_eq!(third[0].review_id, 3020);
    assert_eq!(backend.queries(), 2);
}

#[tokio::test]
async fn miss_populates_cache_for_later_calls() {
    let backend = Arc::new(CountingBackend::open().with_store(4, 6));
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), backend.clone());

    let cold = lister.list_by_store(4, 0, 10).await.unwrap();
    settle(lister.reader()).await;
    let warm = lister.list_by_store(4, 0, 10).await.unwrap();

    assert_eq!(cold, warm);
    assert_eq!(backend.queries(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_entries_are_refetched() {
    let backend = Arc::new(CountingBackend::open().with_store(5, 2));
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), backend.clone());

    lister.list_by_store(5, 0, 10).await.unwrap();
    settle(lister.reader()).await;

    tokio::time::advance(Duration::from_secs(299)).await;
    lister.list_by_store(5, 0, 10).await.unwrap();
    assert_eq!(backend.queries(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    lister.list_by_store(5, 0, 10).await.unwrap();
    assert_eq!(backend.queries(), 2);
}

#[tokio::test]
async fn one_malformed_document_is_skipped() {
    let backend = Arc::new(CountingBackend::open());
    let mut documents: Vec<Value> = (0..10).map(|n| review(600 + n, 6)).collect();
    documents[4]["score"] = json!("five stars");
    backend.inner.extend("review", documents);
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), backend);

    let page = lister.list_by_store(6, 0, 10).await.unwrap();
    assert_eq!(page.len(), 9);
    assert!(page.iter().all(|record| record.review_id != 604));
    assert_eq!(lister.reader().stats().decode_failures(), 1);
}

#[tokio::test]
async fn cache_fault_is_surfaced_without_querying_backend() {
    let backend = Arc::new(CountingBackend::open().with_store(8, 3));
    let lister = ReviewLister::new(Arc::new(FaultyCache), backend.clone());

    let err = lister.list_by_store(8, 0, 10).await.unwrap_err();
    match err {
        PageError::Cache { key, source } => {
            assert_eq!(key, "review:8:0:10");
            assert_eq!(source.message(), "connection reset");
        }
        other => panic!("expected a cache error, got {other:?}"),
    }
    assert_eq!(backend.queries(), 0);
}

#[tokio::test]
async fn backend_failure_reaches_every_waiter() {
    let lister = ReviewLister::new(Arc::new(MemoryCacheStore::new()), Arc::new(FailingBackend));

    let results = join_all((0..4).map(|_| lister.list_by_store(1, 0, 10))).await;
    for result in results {
        assert!(matches!(result, Err(PageError::Backend { ref key, .. }) if key == "review:1:0:10"));
    }

    settle(lister.reader()).await;
    assert_eq!(lister.reader().in_flight(), 0);
}

#[tokio::test]
async fn failed_cache_write_still_returns_data() {
    let backend = Arc::new(CountingBackend::open().with_store(2, 3));
    let lister = ReviewLister::new(Arc::new(ReadOnlyCache), backend.clone());

    let page = lister.list_by_store(2, 0, 10).await.unwrap();
    assert_eq!(page.len(), 3);

    settle(lister.reader()).await;
    assert_eq!(lister.reader().stats().cache_write_failures(), 1);

    // Nothing was cached, so the next call goes upstream again.
    lister.list_by_store(2, 0, 10).await.unwrap();
    assert_eq!(backend.queries(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_caller_does_not_cancel_the_load() {
    let cache = Arc::new(MemoryCacheStore::new());
    let backend = Arc::new(CountingBackend::gated().with_store(11, 4));
    let lister = ReviewLister::new(cache.clone(), backend.clone());

    let token = CancellationToken::new();
    let leader = tokio::spawn({
        let lister = lister.clone();
        let token = token.clone();
        async move { lister.list_by_store_cancellable(11, 0, 10, &token).await }
    });
    let counted = backend.clone();
    wait_until(move || counted.queries() == 1).await;

    let follower = tokio::spawn({
        let lister = lister.clone();
        async move { lister.list_by_store(11, 0, 10).await }
    });
    let stats_lister = lister.clone();
    wait_until(move || stats_lister.reader().stats().coalesced_waits() == 1).await;

    token.cancel();
    assert!(matches!(
        leader.await.unwrap(),
        Err(PageError::Flight(FlightError::Cancelled))
    ));

    backend.release();
    assert_eq!(follower.await.unwrap().unwrap().len(), 4);

    settle(lister.reader()).await;
    assert!(cache.get("review:11:0:10").await.unwrap().is_some());
    assert_eq!(backend.queries(), 1);
}
