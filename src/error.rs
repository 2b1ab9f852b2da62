use thiserror::Error;

/// Result alias for `relay-core` operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the mapper, worker pool, and local backend (§7 of the
/// spec). Registry/codec failures from the transport layer and the generic
/// `Object` contract failures convert in via `#[from]`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Dispatch target absent. Surfaced as a receipt status by the mapper,
    /// not raised to callers directly — this variant exists for the few
    /// call sites (e.g. `Mapper::dispatch`) that report it as a `Result`.
    #[error("worker not found")]
    WorkerNotFound,

    /// `Mapper::allocate_workers` called twice for the same name.
    #[error("name already allocated: {0}")]
    NameAlreadyAllocated(String),

    /// A channel the caller expected to still be open was closed mid-operation.
    #[error("channel closed during operation")]
    ClosedDuringOperation,

    #[error(transparent)]
    Transport(#[from] relay_transport::TransportError),

    #[error(transparent)]
    Common(#[from] relay_common::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
