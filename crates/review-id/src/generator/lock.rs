#[cfg(feature = "tracing")]
use tracing::instrument;

use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    generator::IdGenerator,
    id::SnowflakeId,
    time::{REVIEW_EPOCH, TimeSource},
};

/// Mutable per-instance counters. Only ever touched under the lock.
#[derive(Debug)]
struct State {
    /// Last millisecond (since the Unix epoch) an ID was issued for, `-1`
    /// before the first call.
    last_timestamp: i64,
    sequence: i64,
}

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The whole read-clock / compare / bump-sequence / compose step runs under a
/// single [`parking_lot::Mutex`], so exactly one caller computes an ID at a
/// time. No I/O happens while the lock is held.
///
/// ## Clock behaviour
/// - Same millisecond as the previous ID: the sequence increments. When it
///   wraps past 4095 the caller spins, still holding the lock, until the
///   clock moves past the last issued millisecond.
/// - Clock moved forward: the sequence resets to zero.
/// - Clock moved backward: the generator keeps using the last issued
///   millisecond and keeps incrementing the sequence. IDs stay unique and
///   increasing, but a long rollback can exhaust the sequence and park
///   callers in the spin until real time catches up.
///
/// Construct one per process with its static identifiers and share it
/// (`Arc<LockSnowflakeGenerator<_>>` or `Arc<dyn IdGenerator>`).
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    state: Mutex<State>,
    worker_id: i64,
    datacenter_id: i64,
    time: T,
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSnowflakeGenerator`].
    ///
    /// # Parameters
    ///
    /// - `worker_id`: identifies this process within its datacenter, `[0, 31]`.
    /// - `datacenter_id`: identifies the deployment group, `[0, 31]`.
    /// - `time`: a [`TimeSource`] (usually [`WallClock`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerIdOutOfRange`] or
    /// [`Error::DatacenterIdOutOfRange`] if either identifier does not fit its
    /// 5-bit field.
    ///
    /// [`WallClock`]: crate::WallClock
    pub fn new(worker_id: i64, datacenter_id: i64, time: T) -> Result<Self> {
        let max_worker_id = SnowflakeId::max_worker_id();
        if !(0..=max_worker_id).contains(&worker_id) {
            return Err(Error::WorkerIdOutOfRange {
                worker_id,
                max: max_worker_id,
            });
        }

        let max_datacenter_id = SnowflakeId::max_datacenter_id();
        if !(0..=max_datacenter_id).contains(&datacenter_id) {
            return Err(Error::DatacenterIdOutOfRange {
                datacenter_id,
                max: max_datacenter_id,
            });
        }

        Ok(Self {
            state: Mutex::new(State {
                last_timestamp: -1,
                sequence: 0,
            }),
            worker_id,
            datacenter_id,
            time,
        })
    }

    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    pub fn datacenter_id(&self) -> i64 {
        self.datacenter_id
    }

    /// Generates the next ID.
    ///
    /// # Example
    /// ```
    /// use review_id::{LockSnowflakeGenerator, WallClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(0, 0, WallClock).unwrap();
    /// let first = generator.next_id();
    /// let second = generator.next_id();
    /// assert!(first < second);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> SnowflakeId {
        let mut state = self.state.lock();

        let mut now = self.time.current_millis();
        if now < state.last_timestamp {
            now = Self::cold_clock_behind(now, state.last_timestamp);
        }

        if now == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SnowflakeId::SEQUENCE_MASK;
            if state.sequence == 0 {
                now = self.wait_past(state.last_timestamp);
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = now;

        SnowflakeId::from_components(
            now - REVIEW_EPOCH,
            self.datacenter_id,
            self.worker_id,
            state.sequence,
        )
    }

    /// Spins until the clock reads strictly later than `last_timestamp`.
    fn wait_past(&self, last_timestamp: i64) -> i64 {
        loop {
            let now = self.time.current_millis();
            if now > last_timestamp {
                return now;
            }
            core::hint::spin_loop();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: i64, last_timestamp: i64) -> i64 {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            behind_ms = last_timestamp - now,
            "clock moved backwards, reusing last timestamp"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = now;
        last_timestamp
    }
}

impl<T> IdGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_id(&self) -> SnowflakeId {
        self.next_id()
    }
}
