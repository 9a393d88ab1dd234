//! Error types shared by every public operation.
//!
//! Errors are data: each variant carries enough context to render a short
//! human-readable reason. Panics are reserved for internal invariant
//! violations (slab corruption) and indicate a bug.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a database or collection operation can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No collection is registered under the given name.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A collection with the given name already exists.
    #[error("collection already exists: {0}")]
    CollectionExists(String),

    /// No record carries the given value.
    #[error("value not found: {0}")]
    ValueNotFound(String),

    /// No record matches the queried vector's sign signature.
    #[error("no record matches the given vector")]
    VectorNotFound,

    /// A record with the same value already exists in the collection.
    #[error("duplicate value: {0}")]
    DuplicateValue(String),

    /// An existing record has the same sign signature. Vectors with
    /// identical sign patterns are treated as duplicates.
    #[error("duplicate vector: signature collides with an existing record")]
    DuplicateVector,

    /// Vector length does not match the collection dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The metric identifier is not one of the supported spellings.
    #[error("unknown distance metric: {0}")]
    InvalidMetric(String),

    /// Malformed input: empty name or value, non-finite component,
    /// out-of-range parameter, or an unsupported operation combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Standalone distance helpers received unequal-length inputs.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
