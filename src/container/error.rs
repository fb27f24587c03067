use thiserror::Error;

/// Errors that can occur while writing or reading a container
#[derive(Debug, Error)]
pub enum ContainerError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Manifest serialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdfError(#[from] netcdf::Error),

    /// Dimension declared twice
    #[error("Dimension '{0}' already defined")]
    DuplicateDimension(String),

    /// Variable refers to a dimension that was never declared
    #[error("Variable '{variable}' uses undeclared dimension '{dimension}'")]
    UnknownDimension {
        /// Variable path
        variable: String,
        /// Missing dimension name
        dimension: String,
    },

    /// Group path does not exist
    #[error("Group '{0}' does not exist")]
    UnknownGroup(String),

    /// Group or variable name already used in its parent
    #[error("'{0}' already exists")]
    DuplicateEntry(String),

    /// Shape disagrees with the declared dimensions or the data length
    #[error("Variable '{variable}': {reason}")]
    ShapeMismatch {
        /// Variable path
        variable: String,
        /// Description of the mismatch
        reason: String,
    },

    /// File is not a readable container
    #[error("Invalid container: {0}")]
    InvalidFormat(String),

    /// Variable path not present in the container
    #[error("Variable '{0}' not found")]
    VariableNotFound(String),
}
