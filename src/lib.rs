//! # obs2nc - Schema-Driven Observation Containers
//!
//! `obs2nc` converts batches of station observation records into grouped,
//! dimensioned, typed container files. The layout of every file is dictated
//! by a declarative schema: header fields become scalar (or fixed-size)
//! variables filled once per file, observation fields become variables
//! stacked along a record dimension.
//!
//! ## Key Features
//!
//! - **Declarative Schemas**: JSON trees of groups and field tuples, with
//!   source-key markers for remapping, defaulting, and omission.
//!
//! - **Dimension Deduplication**: Dimensions declared anywhere in the tree are
//!   collected once by name; conflicting sizes are rejected at compile time.
//!
//! - **Deterministic Naming**: Output file names are synthesized from
//!   structured naming metadata and the batch start time.
//!
//! - **Reproducible Output**: Identical inputs produce byte-identical archive
//!   containers; failed renders leave nothing at the target path.
//!
//! - **NetCDF-4 Output**: Optional `netcdf` feature writes real NetCDF-4 files
//!   through libnetcdf.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obs2nc::generator::{ContainerGenerator, RenderOptions};
//! use obs2nc::records::parse_records;
//!
//! let generator = ContainerGenerator::from_json_str(r#"{
//!     "head": [["station", ["Station_Name", "string", [], "Station name", "-", ""]]],
//!     "observation": [
//!         ["Datetime", "string", [["Datetime", null]], "Datetime", "-"],
//!         ["T", "float", [["Datetime", null]], "Air temperature", "K"]
//!     ]
//! }"#)?;
//!
//! let batch = parse_records(r#"[
//!     {"Datetime": "2024-03-01 10:00:00", "station": "Xueshan", "T": 280.5},
//!     {"Datetime": "2024-03-01 10:00:10", "T": 281.0}
//! ]"#)?;
//!
//! let stats = generator.render("out/station.nc", &batch)?;
//! println!("{}", stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`dtype`]: Type catalog, fill values, and value coercion
//! - [`schema`]: Declarative schema model, compiler, and file naming
//! - [`records`]: Input records and batch loading
//! - [`container`]: Archive and NetCDF-4 container backends
//! - [`generator`]: Header resolution and the container renderer

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod container;
pub mod dtype;
pub mod generator;
pub mod records;
pub mod schema;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::container::{
        ArchiveReader, ContainerError, ContainerFormat, ContainerWriter, VariableData,
        VariableSpec,
    };
    pub use crate::dtype::{NcType, ValueError};
    pub use crate::generator::{
        fill_headers, ContainerGenerator, GeneratorConfig, HeaderValues, RenderError,
        RenderOptions, RenderStats,
    };
    pub use crate::records::{load_records, parse_records, Record, RecordError};
    pub use crate::schema::{
        CompiledSchema, Dimension, DimensionDecl, FieldDecl, FieldSpec, GroupDecl,
        NamingMetadata, SchemaDeclaration, SchemaError, SourceMarker, TimestampFormatError,
    };
}
