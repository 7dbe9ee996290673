//! The store error taxonomy.
//!
//! Engine-native errors are translated into this taxonomy at the store
//! boundary; callers above the store never see `rusqlite` error types.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested resource does not exist (or only exists as a
    /// placeholder row with no spec).
    #[error("resource not found")]
    ResourceNotFound,

    /// A resource with the same name already exists in the organization.
    #[error("a resource with this name already exists")]
    DuplicateName,

    /// The caller supplied a stale expected resource version.
    #[error("the resource version does not match the stored resource version")]
    ResourceVersionConflict,

    /// The guarded update matched zero rows: another writer won the race
    /// between the read and the write. Retried internally up to a bound.
    #[error("no rows were updated")]
    NoRowsUpdated,

    /// Direct mutation of a resource managed by another resource.
    #[error("updating a resource with an owner is not allowed")]
    UpdatingResourceWithOwnerNotAllowed,

    /// The caller passed no resource where one is required.
    #[error("resource is nil")]
    ResourceIsNil,

    /// The resource carries no name in its metadata.
    #[error("resource name is nil")]
    ResourceNameIsNil,

    /// The metadata resource version is not a decimal integer.
    #[error("illegal resource version format")]
    IllegalResourceVersionFormat,

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization or deserialization of a stored payload failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the operation may succeed when re-run from the top.
    ///
    /// Only the lost-race signal is retryable; precondition failures such
    /// as [`StoreError::ResourceVersionConflict`] are genuine client errors
    /// and must be propagated immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NoRowsUpdated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lost_races_are_retryable() {
        assert!(StoreError::NoRowsUpdated.is_retryable());
        assert!(!StoreError::ResourceVersionConflict.is_retryable());
        assert!(!StoreError::ResourceNotFound.is_retryable());
        assert!(!StoreError::UpdatingResourceWithOwnerNotAllowed.is_retryable());
        assert!(!StoreError::DuplicateName.is_retryable());
    }
}
