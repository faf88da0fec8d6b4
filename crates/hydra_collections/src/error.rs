//! # Collection Error Types
//!
//! All faults that can surface from the concurrent containers.
//!
//! Every fault is detected before any partial mutation is committed (bounds
//! checks precede shifting and copying), and every fault path releases the
//! container's gate on the way out - the guard's `Drop` impl guarantees it.
//! Nothing here is fatal: all faults are recoverable by the caller, who
//! decides whether to retry, skip or abort.

use thiserror::Error;

/// Faults surfaced by the concurrent containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A positional operation received an index outside the valid range.
    ///
    /// Valid indices are `[0, len)` for access/removal and `[0, len]` for
    /// insertion.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The container's logical length at the time of the call.
        len: usize,
    },

    /// A copy destination was too small, or a capacity computation overflowed.
    #[error("capacity exceeded: required {required}, available {available}")]
    CapacityExceeded {
        /// The number of slots the operation needed.
        required: usize,
        /// The number of slots actually available.
        available: usize,
    },

    /// An iterator detected a structural mutation made after its creation.
    ///
    /// Iteration is fail-fast, not serialized: the iterator compares its
    /// captured generation against the container's live generation on every
    /// step and surfaces this fault on the first mismatch.
    #[error("collection was structurally modified during iteration")]
    ConcurrentModification,

    /// A type-erased entry point received a value of the wrong concrete type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch {
        /// Name of the type the container stores.
        expected: &'static str,
    },

    /// A mandatory argument was structurally unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Result type for container operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CollectionError::IndexOutOfBounds { index: 9, len: 3 };
        assert_eq!(err.to_string(), "index 9 out of bounds for length 3");

        let err = CollectionError::CapacityExceeded {
            required: 8,
            available: 2,
        };
        assert_eq!(err.to_string(), "capacity exceeded: required 8, available 2");

        let err = CollectionError::TypeMismatch { expected: "u32" };
        assert_eq!(err.to_string(), "type mismatch: expected u32");
    }
}
