use thiserror::Error;

/// A result type for generator construction.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced while building a generator.
///
/// Generation itself is infallible once a generator exists; the only way to
/// fail is to hand the constructor identifiers that do not fit their bit
/// fields. Both cases are configuration mistakes and should abort startup.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The worker ID is negative or wider than the worker field.
    #[error("worker ID {worker_id} out of range [0, {max}]")]
    WorkerIdOutOfRange { worker_id: i64, max: i64 },

    /// The datacenter ID is negative or wider than the datacenter field.
    #[error("datacenter ID {datacenter_id} out of range [0, {max}]")]
    DatacenterIdOutOfRange { datacenter_id: i64, max: i64 },
}
