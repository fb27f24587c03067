//! # Declarative Schema
//!
//! This module turns a declarative description of a container file into the
//! compiled model the renderer walks.
//!
//! ## Pipeline
//!
//! ```text
//! schema.json ──parse──▶ SchemaDeclaration ──compile──▶ CompiledSchema
//!                         (markers, dims with sizes)     (source keys, dim names,
//!                                                          dimension set, mapping)
//! ```
//!
//! ## Field Markers
//!
//! | Marker | Source key | Allowed in |
//! |--------|------------|------------|
//! | `"+"` | output name | header, observation |
//! | `"-"` | none (default value) | header only |
//! | any other string | that string | header, observation |
//! | bare tuple | output name | header, observation |
//!
//! Markers are resolved once at compile time; downstream code only sees
//! `FieldSpec::source_key`.
//!
//! ## Usage
//!
//! ```rust
//! use obs2nc::schema::SchemaDeclaration;
//!
//! let schema = SchemaDeclaration::from_json_str(r#"{
//!     "head": [["-", ["Country", "string", [], "Country", "-", "China"]]],
//!     "observation": [["T", "float", [["time", null]], "Temperature", "K"]]
//! }"#)?
//! .compile()?;
//!
//! assert_eq!(schema.dimensions().len(), 1);
//! assert_eq!(schema.data_mapping()["T"], "T");
//! # Ok::<(), obs2nc::schema::SchemaError>(())
//! ```

mod compiler;
mod declaration;
mod entities;
mod error;
pub mod naming;


pub use compiler::compile;
pub use declaration::{
    DimensionDecl, FieldDecl, GroupDecl, SchemaDeclaration, SourceMarker, MARKER_OMIT,
    MARKER_SAME_KEY, NAMING_KEY,
};
pub use entities::{
    field_key, CompiledSchema, DataClass, Dimension, FieldSpec, NamedNode, SchemaNode,
    PATH_SEPARATOR,
};
pub use error::SchemaError;
pub use naming::{NamingMetadata, TimestampFormatError};
