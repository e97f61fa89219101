//! Adapters for the two external collaborators of the read path.
//!
//! - [`CacheStore`] - key/value storage with per-entry TTL and a distinct
//!   miss signal (`Ok(None)`).
//! - [`SearchBackend`] - paginated equality-filter queries over indexed
//!   documents.
//!
//! Both traits are object safe so deployments can swap a networked client in
//! for the in-memory implementations provided here.

mod interface;
mod memory;

pub use interface::*;
pub use memory::*;
