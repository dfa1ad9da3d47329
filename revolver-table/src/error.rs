//! Errors in the table.
use crate::Dtype;
use thiserror::Error;

/// Errors raised by [`FieldTable`](crate::FieldTable) and [`FieldArray`](crate::FieldArray).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// The requested field does not exist.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The shape of an array does not agree with the table or the destination.
    #[error("Shape mismatch for field {key}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Name of the field.
        key: String,
        /// Expected shape. Only the leading dimensions are listed when
        /// the batch shape of a table is checked.
        expected: Vec<usize>,
        /// Actual shape.
        found: Vec<usize>,
    },

    /// The element type of an array does not agree with the destination.
    #[error("Type mismatch for field {key}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the field.
        key: String,
        /// Expected element type.
        expected: Dtype,
        /// Actual element type.
        found: Dtype,
    },

    /// A row or column index is outside of the array.
    #[error("Index {index} out of bounds for axis of length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the axis.
        len: usize,
    },

    /// The storage location is not supported by this build.
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),
}

impl TableError {
    /// Replaces the field name of shape or type mismatches.
    ///
    /// [`FieldArray`](crate::FieldArray) does not know its own name, so the table
    /// fills it in when it forwards the error.
    pub fn with_key(self, name: &str) -> Self {
        match self {
            Self::ShapeMismatch {
                expected, found, ..
            } => Self::ShapeMismatch {
                key: name.to_string(),
                expected,
                found,
            },
            Self::TypeMismatch {
                expected, found, ..
            } => Self::TypeMismatch {
                key: name.to_string(),
                expected,
                found,
            },
            e => e,
        }
    }
}
