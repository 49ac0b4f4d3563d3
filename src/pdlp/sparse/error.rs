use derive_more::{Display, Error};

/// Shape-mismatch errors raised by the sparse substrate.
///
/// These are programming errors: they name the offending operation and
/// sizes and are never recovered from internally (see [`crate::pdlp`]
/// error handling design).
#[derive(Debug, Display, Error, PartialEq, Clone, Copy)]
pub enum SparseError {
    #[display("`{operation}`: vector length mismatch (expected {expected}, found {found})")]
    LengthMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },

    #[display("`{operation}`: matrix/vector size mismatch (matrix expects {expected}, found {found})")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },
}
