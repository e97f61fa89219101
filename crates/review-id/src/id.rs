use core::fmt;

use crate::time::REVIEW_EPOCH;

/// A 64-bit Snowflake ID using the review platform layout
///
/// - 1 bit reserved (always zero, so the ID stays a positive `i64`)
/// - 41 bits timestamp (ms since [`REVIEW_EPOCH`])
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// Fields are packed most-significant first, so numeric order follows
/// (timestamp, datacenter, worker, sequence).
///
/// [`REVIEW_EPOCH`]: crate::REVIEW_EPOCH
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnowflakeId {
    id: i64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: i64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit datacenter ID field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: i64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: i64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: i64 = (1 << 12) - 1;

    pub const TIMESTAMP_SHIFT: u32 = 22;
    pub const DATACENTER_ID_SHIFT: u32 = 17;
    pub const WORKER_ID_SHIFT: u32 = 12;
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Packs the four fields into an ID. Each field is masked to its width.
    pub const fn from_components(
        timestamp: i64,
        datacenter_id: i64,
        worker_id: i64,
        sequence: i64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Extracts the timestamp delta (milliseconds since [`REVIEW_EPOCH`]).
    pub const fn timestamp(&self) -> i64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Absolute creation time in milliseconds since the Unix epoch.
    pub const fn timestamp_millis(&self) -> i64 {
        self.timestamp() + REVIEW_EPOCH
    }

    pub const fn datacenter_id(&self) -> i64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    pub const fn worker_id(&self) -> i64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    pub const fn sequence(&self) -> i64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub const fn max_datacenter_id() -> i64 {
        Self::DATACENTER_ID_MASK
    }

    pub const fn max_worker_id() -> i64 {
        Self::WORKER_ID_MASK
    }

    pub const fn max_sequence() -> i64 {
        Self::SEQUENCE_MASK
    }

    pub const fn to_raw(&self) -> i64 {
        self.id
    }

    pub const fn from_raw(raw: i64) -> Self {
        Self { id: raw }
    }

    /// Returns `true` if the reserved sign bit is clear.
    ///
    /// Every ID minted by a generator is valid; a negative raw value can only
    /// come from outside (a corrupted column, a hand-written request).
    pub const fn is_valid(&self) -> bool {
        self.id >= 0
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &self.id)
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<i64> for SnowflakeId {
    fn from(raw: i64) -> Self {
        Self::from_raw(raw)
    }
}
