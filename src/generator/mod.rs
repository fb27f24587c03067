//! # Container Generator
//!
//! [`ContainerGenerator`] owns a compiled schema and renders batches of
//! records into container files.
//!
//! ## Render Steps
//!
//! 1. Reject an empty batch.
//! 2. Resolve header values from the first record, placeholder times, and
//!    compiled defaults ([`fill_headers`]).
//! 3. Stack observation values along each variable's leading dimension and
//!    convert every value to its declared type.
//! 4. Create the container, then write dimensions, groups, and variables.
//! 5. Finish the container; the file appears at the target path only now.
//!
//! The compiled schema is read-only during rendering, so one generator can
//! render several batches concurrently to different paths.
//!
//! ## Example
//!
//! ```rust,no_run
//! use obs2nc::generator::ContainerGenerator;
//! use obs2nc::records::load_records;
//!
//! let generator = ContainerGenerator::from_path("schema.json")?;
//! let batch = load_records("records.jsonl")?;
//! let stats = generator.render("out/station.nc", &batch)?;
//! println!("{}", stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod headers;
mod render;
mod stats;


use std::path::Path;

pub use config::{
    GeneratorConfig, DEFAULT_COMPRESSION_LEVEL, DEFAULT_TIME_KEY, MAX_COMPRESSION_LEVEL,
};
pub use error::RenderError;
pub use headers::{
    fill_headers, HeaderValues, RenderOptions, CREATION_TIME_FIELD, OBSERVATION_END_FIELD,
    OBSERVATION_START_FIELD,
};
pub use stats::RenderStats;

use crate::records::Record;
use crate::schema::{CompiledSchema, SchemaDeclaration, SchemaError, TimestampFormatError};

/// Renders record batches into containers laid out by a compiled schema
#[derive(Debug, Clone)]
pub struct ContainerGenerator {
    schema: CompiledSchema,
    config: GeneratorConfig,
}

impl ContainerGenerator {
    /// Compile `declaration` with the default configuration.
    pub fn new(declaration: &SchemaDeclaration) -> Result<Self, SchemaError> {
        Self::with_config(declaration, GeneratorConfig::default())
    }

    /// Compile `declaration` with a custom configuration.
    pub fn with_config(
        declaration: &SchemaDeclaration,
        config: GeneratorConfig,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: declaration.compile()?,
            config,
        })
    }

    /// Build from a JSON declaration string.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Self::new(&SchemaDeclaration::from_json_str(content)?)
    }

    /// Build from a JSON declaration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        Self::new(&SchemaDeclaration::from_path(path)?)
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    /// The compiled schema
    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// The active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// File name for a batch starting at `start_time`.
    ///
    /// Returns an empty string when the schema declares no naming section.
    pub fn file_name(&self, start_time: &str) -> Result<String, TimestampFormatError> {
        match self.schema.naming() {
            Some(naming) => naming.file_name(start_time),
            None => Ok(String::new()),
        }
    }

    /// Render `batch` to `path`, taking start and end times from the batch.
    pub fn render<P: AsRef<Path>>(
        &self,
        path: P,
        batch: &[Record],
    ) -> Result<RenderStats, RenderError> {
        let options = RenderOptions::from_batch(batch, &self.config.time_key);
        self.render_with(path, batch, &options)
    }

    /// Render `batch` to `path` with explicit placeholder times.
    pub fn render_with<P: AsRef<Path>>(
        &self,
        path: P,
        batch: &[Record],
        options: &RenderOptions,
    ) -> Result<RenderStats, RenderError> {
        render::render(&self.schema, &self.config, path.as_ref(), batch, options)
    }
}
