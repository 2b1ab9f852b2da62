use thiserror::Error;

use crate::object::ObjectKind;

/// Result alias for `relay-common` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the routine supervisors and the `Object` contract.
///
/// Component-specific taxonomies (registry violations, codec failures, ...)
/// live in their owning crates and convert into the caller's own error type;
/// this enum only covers what is generic across every component.
#[derive(Debug, Error)]
pub enum Error {
    /// `Object::expect` was asked about a combination of kinds the object
    /// does not provide.
    #[error("unsupported object kind requested: {0:?}")]
    UnsupportedKind(ObjectKind),

    /// A channel the caller expected to still be open was closed mid-operation.
    /// Routines recover by exiting cleanly; this variant exists for callers
    /// that need to distinguish it from other failures.
    #[error("channel closed during operation")]
    ClosedDuringOperation,
}
