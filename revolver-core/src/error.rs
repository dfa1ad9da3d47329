//! Errors in the library.
use revolver_table::{Dtype, TableError};
use thiserror::Error;

/// Errors in the replay buffer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayBufferError {
    /// A field has a different element type than the one stored in the buffer.
    #[error("Type mismatch for field {key}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the field.
        key: String,
        /// Element type stored in the buffer.
        expected: Dtype,
        /// Element type of the given array.
        found: Dtype,
    },

    /// The batch shape of a payload or the shape of a field is not compatible
    /// with the buffer.
    #[error("Shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// What was checked, e.g., `batch shape` or `field observations`.
        what: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        found: Vec<usize>,
    },

    /// The requested batch size is zero or larger than the capacity.
    #[error("Batch size {batch_size} is out of bounds for the replay buffer of capacity {capacity}")]
    Bounds {
        /// Requested batch size.
        batch_size: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// Sampling from a buffer with no sampleable transition.
    #[error("The replay buffer has no transition to sample")]
    EmptyBuffer,

    /// A field stored in the buffer is missing in the payload, or a requested
    /// field does not exist.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The payload has a field the buffer was not set up with.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The field name is used for the next observations synthesized at sampling.
    #[error("Field {0} is synthesized at sampling and cannot be stored")]
    ReservedField(String),

    /// Invalid configuration of the buffer.
    #[error("Invalid replay buffer configuration: {0}")]
    InvalidConfig(String),

    /// Other errors of the underlying table.
    #[error("Table error: {0}")]
    Table(TableError),
}

impl From<TableError> for ReplayBufferError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::MissingField(key) => Self::MissingField(key),
            TableError::ShapeMismatch {
                key,
                expected,
                found,
            } => Self::ShapeMismatch {
                what: if key.is_empty() {
                    "batch shape".to_string()
                } else {
                    format!("field {}", key)
                },
                expected,
                found,
            },
            TableError::TypeMismatch {
                key,
                expected,
                found,
            } => Self::TypeMismatch {
                key,
                expected,
                found,
            },
            e => Self::Table(e),
        }
    }
}
