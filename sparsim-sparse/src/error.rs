use thiserror::Error;

pub type SparseResult<T> = Result<T, SparseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SparseError {
    #[error("dimension mismatch in {operation}: expected {expected}, got {actual}")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of bounds in {operation} (bound {bound})")]
    IndexOutOfBounds {
        operation: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("entry ({row}, {col}) not found in sparsity pattern")]
    EntryNotFound { row: usize, col: usize },

    #[error("cannot {operation} a borrowed buffer")]
    BorrowedBuffer { operation: &'static str },

    #[error("invalid CSR structure: {0}")]
    InvalidStructure(String),

    #[error("invalid single vector representation: {0}")]
    InvalidSingleVectorRepresentation(String),
}

impl SparseError {
    pub(crate) fn dimension_mismatch(operation: &'static str, expected: usize, actual: usize) -> Self {
        SparseError::DimensionMismatch {
            operation,
            expected,
            actual,
        }
    }

    pub(crate) fn check_dimension(operation: &'static str, expected: usize, actual: usize) -> SparseResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(operation, expected, actual))
        }
    }
}
