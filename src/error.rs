//! Error types for arrowframe operations.

use arrow::error::ArrowError;
use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error types for expression evaluation and batch operators.
///
/// Every error is a recoverable value: an operator that fails returns one of
/// these and produces no partial batch.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operand was not of the kind the operator requires.
    #[error("Type mismatch: {op} requires {expected} type, got {actual}")]
    TypeMismatch {
        op: String,
        expected: String,
        actual: String,
    },

    /// No dispatch rule exists for the operand types.
    #[error("Unsupported type for {op}: {types}")]
    UnsupportedType { op: String, types: String },

    /// A referenced column is absent from the batch.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Two columns that must have equal length do not.
    #[error("Length mismatch in {context}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The operation is not supported for the given input.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Division or modulo by zero during expression evaluation.
    #[error("Division by zero at row {row}")]
    DivisionByZero { row: usize },

    /// Join keys are missing, empty or incompatible.
    #[error("Invalid join key: {0}")]
    InvalidJoinKey(String),

    /// An operator received no usable input.
    #[error("Nil input: {0}")]
    NilInput(String),

    /// An argument is out of range or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A memory reservation would exceed the pool limit.
    #[error("Memory limit exceeded: requested {requested} bytes with {used} bytes in use, limit is {limit} bytes")]
    MemoryLimitExceeded {
        requested: usize,
        used: usize,
        limit: usize,
    },

    /// Error raised by an Arrow compute kernel.
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl EngineError {
    pub(crate) fn column_not_found(name: impl Into<String>) -> Self {
        EngineError::ColumnNotFound { name: name.into() }
    }

    pub(crate) fn type_mismatch(
        op: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        EngineError::TypeMismatch {
            op: op.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn unsupported_type(op: impl Into<String>, types: impl Into<String>) -> Self {
        EngineError::UnsupportedType {
            op: op.into(),
            types: types.into(),
        }
    }

    pub(crate) fn length_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        EngineError::LengthMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}
