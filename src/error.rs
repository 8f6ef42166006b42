use thiserror::Error;

/// Errors returned by the projection and clustering engines in this crate.
///
/// Expected degenerate inputs (fewer than 2 valid correlation pairs, fewer
/// distinct points than requested clusters) are *not* errors; those paths
/// return `None` or a degenerate-but-valid result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Not enough data to run the requested computation.
    #[error("insufficient data: need at least {required} {what}, found {actual}")]
    InsufficientData {
        /// What is being counted (rows, columns, ...).
        what: &'static str,
        /// Minimum required count.
        required: usize,
        /// Actual count found.
        actual: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
