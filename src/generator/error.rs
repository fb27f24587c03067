use thiserror::Error;

use crate::container::ContainerError;
use crate::dtype::ValueError;

/// Errors that can occur while rendering a batch
///
/// Every variant aborts only the current render; the generator stays usable.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The batch has no records
    #[error("Cannot render an empty batch")]
    EmptyBatch,

    /// A record lacks a key the schema reads
    #[error("Field '{field}': record {record} has no key '{key}'")]
    MissingField {
        /// Field path
        field: String,
        /// Source key that was looked up
        key: String,
        /// Zero-based record index
        record: usize,
    },

    /// The destination could not be opened for writing
    #[error("Failed to create container: {0}")]
    ContainerCreate(#[source] ContainerError),

    /// Writing or closing the container failed
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// A value cannot be represented in the variable's type
    #[error("Variable '{variable}': {source}")]
    ValueConversion {
        /// Field path
        variable: String,
        /// Conversion failure
        #[source]
        source: ValueError,
    },

    /// Value count disagrees with the variable's dimensions
    #[error("Variable '{variable}': {reason}")]
    ShapeMismatch {
        /// Field path
        variable: String,
        /// Description of the mismatch
        reason: String,
    },
}
