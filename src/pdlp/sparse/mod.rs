pub mod diagonal;
pub mod error;
pub mod matrix;
pub mod ops;
pub mod vector;

pub use diagonal::Diagonal;
pub use error::SparseError;
pub use matrix::CsrMatrix;
pub use vector::Vector;
