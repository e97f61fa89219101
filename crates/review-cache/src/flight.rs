//! In-flight request registry.
//!
//! A [`FlightGroup`] maps keys to outstanding loads. The first caller to
//! [`join`](FlightGroup::join) a key becomes its leader: its work is spawned
//! onto the runtime and handed a [`Resolver`]. Callers joining while the load
//! is outstanding become followers and receive the leader's outcome instead of
//! starting their own.
//!
//! The entry for a key lives until the leader's work future completes, which
//! may be after it resolved. Callers joining in that window are followers of a
//! flight that already has its value and return immediately. Once the work
//! completes (or panics, or is aborted with the runtime) the entry is removed
//! and the next join starts a fresh flight.
//!
//! Waiting is cancellable per caller. A follower or the leader's own caller
//! giving up never cancels the spawned work, so the remaining waiters still
//! get its result.

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

type Slot<V, E> = Option<Result<V, E>>;

/// Failure of the flight itself, as opposed to the work it carried.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightError {
    /// The leader's work ended without resolving, typically because it
    /// panicked.
    #[error("in-flight load ended without producing a result")]
    Abandoned,

    /// This caller stopped waiting. The load itself keeps running.
    #[error("wait for in-flight load was cancelled")]
    Cancelled,
}

/// How a caller participates in a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Started the load.
    Leader,
    /// Joined a load that was already outstanding.
    Follower,
}

struct Entry<V, E> {
    generation: u64,
    receiver: watch::Receiver<Slot<V, E>>,
}

struct Registry<K, V, E> {
    entries: HashMap<K, Entry<V, E>>,
    next_generation: u64,
}

/// Registry of outstanding loads keyed by `K`, each producing a shared
/// `Result<V, E>`.
pub struct FlightGroup<K, V, E> {
    registry: Arc<Mutex<Registry<K, V, E>>>,
}

impl<K, V, E> Clone for FlightGroup<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K, V, E> Default for FlightGroup<K, V, E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                entries: HashMap::new(),
                next_generation: 0,
            })),
        }
    }
}

impl<K, V, E> FlightGroup<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the flight for `key`, starting one if none is outstanding.
    ///
    /// `work` is only invoked when this caller becomes the leader. The future
    /// it returns is spawned with [`tokio::spawn`], so this must be called
    /// from within a Tokio runtime. Check-and-insert happens under one lock:
    /// at most one flight per key exists at any instant.
    pub fn join<F, Fut>(&self, key: K, work: F) -> Flight<V, E>
    where
        F: FnOnce(Resolver<V, E>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.entries.get(&key) {
            tracing::trace!("joined outstanding flight");
            return Flight {
                role: Role::Follower,
                receiver: entry.receiver.clone(),
            };
        }

        let generation = registry.next_generation;
        registry.next_generation = generation.wrapping_add(1);

        let (sender, receiver) = watch::channel(None);
        registry.entries.insert(
            key.clone(),
            Entry {
                generation,
                receiver: receiver.clone(),
            },
        );
        drop(registry);

        let guard = EntryGuard {
            registry: Arc::clone(&self.registry),
            key,
            generation,
        };
        let load = work(Resolver { sender });
        tokio::spawn(async move {
            let _guard = guard;
            load.await;
        });

        Flight {
            role: Role::Leader,
            receiver,
        }
    }

    /// Number of keys with an outstanding flight.
    pub fn in_flight(&self) -> usize {
        self.registry.lock().entries.len()
    }
}

/// Removes a flight's entry when its work ends, however it ends.
struct EntryGuard<K: Eq + Hash, V, E> {
    registry: Arc<Mutex<Registry<K, V, E>>>,
    key: K,
    generation: u64,
}

impl<K: Eq + Hash, V, E> Drop for EntryGuard<K, V, E> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        if registry
            .entries
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            registry.entries.remove(&self.key);
        }
    }
}

/// Publishes a flight's outcome to its waiters.
pub struct Resolver<V, E> {
    sender: watch::Sender<Slot<V, E>>,
}

impl<V, E> Resolver<V, E> {
    /// Hands `result` to every current and future waiter of this flight.
    pub fn resolve(self, result: Result<V, E>) {
        self.sender.send_replace(Some(result));
    }
}

/// One caller's handle on a flight.
#[must_use = "a flight does nothing for its caller unless waited on"]
pub struct Flight<V, E> {
    role: Role,
    receiver: watch::Receiver<Slot<V, E>>,
}

impl<V, E> Flight<V, E>
where
    V: Clone,
    E: Clone + From<FlightError>,
{
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_leader(&self) -> bool {
        self.role == Role::Leader
    }

    /// Waits for the flight's outcome.
    ///
    /// # Errors
    ///
    /// Returns the leader's error, or [`FlightError::Abandoned`] if its work
    /// ended without resolving.
    pub async fn wait(mut self) -> Result<V, E> {
        let outcome = match self.receiver.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_closed) => None,
        };
        outcome.unwrap_or_else(|| Err(FlightError::Abandoned.into()))
    }

    /// Like [`wait`](Self::wait), but gives up with
    /// [`FlightError::Cancelled`] once `token` fires. The flight itself keeps
    /// running for everyone else.
    pub async fn wait_or_cancel(self, token: &CancellationToken) -> Result<V, E> {
        tokio::select! {
            biased;
            () = token.cancelled() => Err(FlightError::Cancelled.into()),
            result = self.wait() => result,
        }
    }
}
