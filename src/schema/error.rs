use crate::dtype::UnknownTypeError;

/// Errors raised while parsing or compiling a declarative schema
///
/// All of these are fatal to generator construction: no partial schema is
/// ever produced.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// I/O error reading a schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Schema file is not valid JSON
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Top-level schema value is not an object
    #[error("Schema must be a JSON object of sections")]
    NotAnObject,

    /// The schema does not declare exactly one header and one observation section
    #[error("Expected exactly two data sections (header, observation), found {found}: {names:?}")]
    SectionCount {
        /// Number of non-naming sections found
        found: usize,
        /// Names of those sections, in declaration order
        names: Vec<String>,
    },

    /// A section contains no field declarations anywhere in its tree
    #[error("Section '{0}' declares no fields")]
    EmptySection(String),

    /// The `-` marker was used on an observation field
    #[error("Observation field '{field}' in group '{group}' cannot omit its source key")]
    UnsupportedOmission {
        /// Group path of the offending field
        group: String,
        /// Output name of the offending field
        field: String,
    },

    /// Two fields in one group share an output name
    #[error("Duplicate field '{field}' in group '{group}'")]
    DuplicateField {
        /// Group path
        group: String,
        /// Repeated output name
        field: String,
    },

    /// A dimension name is declared with two different sizes
    #[error("Dimension '{name}' declared with size {existing} and again with size {found}")]
    ConflictingDimension {
        /// Dimension name
        name: String,
        /// Size recorded first
        existing: String,
        /// Conflicting size
        found: String,
    },

    /// A field tuple is malformed
    #[error("Invalid field in group '{group}': {reason}")]
    InvalidField {
        /// Group path
        group: String,
        /// What is wrong with it
        reason: String,
    },

    /// A dimension declaration is malformed
    #[error("Invalid dimension in group '{group}': {reason}")]
    InvalidDimension {
        /// Group path
        group: String,
        /// What is wrong with it
        reason: String,
    },

    /// A group value is neither an object of groups nor a list of fields
    #[error("Group '{0}' must be an object of groups or a list of field tuples")]
    InvalidGroup(String),

    /// A group or field name is empty or contains the path separator
    #[error("Invalid name '{name}' in group '{group}': names must be non-empty and must not contain '/'")]
    InvalidName {
        /// Parent group path
        group: String,
        /// Offending name
        name: String,
    },

    /// A field names a type outside the catalog
    #[error("Field '{field}' in group '{group}': {source}")]
    UnknownType {
        /// Group path
        group: String,
        /// Output name
        field: String,
        /// Lookup failure
        #[source]
        source: UnknownTypeError,
    },

    /// The naming tuple has the wrong arity or element types
    #[error("Invalid naming tuple: {0}")]
    InvalidNaming(String),
}
