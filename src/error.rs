use thiserror::Error;

/// Errors reported by the hashing engine.
///
/// Every failure is a precondition violation at the offending call site: a
/// failed insert mutates no table, a failed query returns no partial result,
/// and nothing is retried internally.
#[derive(Debug, Error)]
pub enum LshError {
    /// A construction argument or element-type tag was out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A vector length or signature width did not match at a call site.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[cfg(feature = "persistence")]
    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "persistence")]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, LshError>;
