//! # `review-id`: coordination-free Snowflake IDs
//!
//! Every review, merchant reply and appeal on the platform is keyed by a
//! 64-bit signed integer minted locally by the replica that creates it. No
//! network round trip is involved: uniqueness across replicas comes from the
//! static datacenter and worker identifiers baked into every ID, uniqueness
//! within a replica from a millisecond timestamp plus a 12-bit sequence.
//!
//! ```text
//!  Bit Index:  63          63 62            22 21              17 16          12 11             0
//!              +-------------+----------------+------------------+--------------+---------------+
//!  Field:      | sign (1, 0) | timestamp (41) | datacenter ID (5)| worker ID (5)| sequence (12) |
//!              +-------------+----------------+------------------+--------------+---------------+
//! ```
//!
//! ## Example
//!
//! ```
//! use review_id::{IdGenerator, LockSnowflakeGenerator, WallClock};
//!
//! let generator = LockSnowflakeGenerator::new(3, 1, WallClock).unwrap();
//! let a = generator.next_id();
//! let b = generator.next_id();
//! assert!(a < b);
//! assert_eq!(a.worker_id(), 3);
//! assert_eq!(a.datacenter_id(), 1);
//! ```

mod error;
mod generator;
mod id;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
