use derive_more::{Display, Error};

/// Setup-time errors raised while assembling an [`super::instance::LpInstance`].
///
/// Like [`super::sparse::SparseError`], these are programming errors:
/// they name the offending counts and are never recovered from
/// internally.
#[derive(Debug, Display, Error, PartialEq, Clone)]
pub enum InstanceError {
    #[display(
        "objective coefficient count {found} does not match variable count {expected}"
    )]
    CoefficientCountMismatch { expected: usize, found: usize },

    #[display("bound vector length {found} does not match variable count {expected}")]
    BoundLengthMismatch { expected: usize, found: usize },

    #[display("constraint row count {found} does not match sense count {expected}")]
    SenseCountMismatch { expected: usize, found: usize },

    #[display("dual objective coefficient count {found} does not match constraint count {expected}")]
    DualCoefficientCountMismatch { expected: usize, found: usize },
}
