//! Container output.
//!
//! A container holds named dimensions, a tree of groups, and typed variables
//! with `long_name`/`units` attributes. Two backends share one write
//! interface through [`ContainerWriter`]:
//!
//! - **Archive** (default): a self-describing ZIP archive readable with
//!   [`ArchiveReader`], written atomically via a temporary file.
//! - **NetCDF** (cargo feature `netcdf`): NetCDF-4 through libnetcdf.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::Dimension;

mod archive;
mod data;
mod error;
mod manifest;
#[cfg(feature = "netcdf")]
mod nc4;

#[cfg(test)]
mod tests;

pub use archive::{
    ArchiveReader, ArchiveWriter, CONTAINER_MIMETYPE, DATA_PREFIX, MANIFEST_ENTRY, MIMETYPE_ENTRY,
};
pub use data::VariableData;
pub use error::ContainerError;
pub use manifest::{Manifest, ManifestDimension, ManifestGroup, ManifestVariable, MANIFEST_VERSION};
#[cfg(feature = "netcdf")]
pub use nc4::NetCdfWriter;

/// `long_name` attribute key
pub const ATTR_LONG_NAME: &str = "long_name";

/// `units` attribute key
pub const ATTR_UNITS: &str = "units";

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Portable ZIP archive
    ///
    /// Archives are not NetCDF files even when written under a `.nc` name;
    /// read them with [`ArchiveReader`] or `obs2nc inspect`.
    #[default]
    Archive,
    /// NetCDF-4 file
    #[cfg(feature = "netcdf")]
    NetCdf,
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Archive => write!(f, "archive"),
            #[cfg(feature = "netcdf")]
            ContainerFormat::NetCdf => write!(f, "netcdf"),
        }
    }
}

impl FromStr for ContainerFormat {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "archive" | "zip" => Ok(ContainerFormat::Archive),
            #[cfg(feature = "netcdf")]
            "netcdf" | "nc4" => Ok(ContainerFormat::NetCdf),
            #[cfg(not(feature = "netcdf"))]
            "netcdf" | "nc4" => Err(ContainerError::InvalidFormat(
                "NetCDF output requires building with the `netcdf` feature".to_string(),
            )),
            other => Err(ContainerError::InvalidFormat(format!(
                "unknown container format '{}'",
                other
            ))),
        }
    }
}

/// Definition of one variable to write
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Variable name within its group
    pub name: String,
    /// Dimension names, outermost first
    pub dims: Vec<String>,
    /// Extent along each dimension; empty for scalars
    pub shape: Vec<usize>,
    /// Text attributes
    pub attributes: BTreeMap<String, String>,
    /// Deflate level; ignored for string variables
    pub compression: Option<u32>,
}

impl VariableSpec {
    /// Variable with no dimensions, attributes, or compression
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dims: Vec::new(),
            shape: Vec::new(),
            attributes: BTreeMap::new(),
            compression: None,
        }
    }

    /// Add a dimension with its extent
    pub fn dim(mut self, name: impl Into<String>, extent: usize) -> Self {
        self.dims.push(name.into());
        self.shape.push(extent);
        self
    }

    /// Set a text attribute
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the deflate level
    pub fn compression(mut self, level: Option<u32>) -> Self {
        self.compression = level;
        self
    }
}

/// Open container being written, dispatching to the selected backend
pub enum ContainerWriter {
    /// Archive backend
    Archive(ArchiveWriter),
    /// NetCDF-4 backend
    #[cfg(feature = "netcdf")]
    NetCdf(NetCdfWriter),
}

impl ContainerWriter {
    /// Open a container for writing at `path`.
    pub fn create<P: AsRef<Path>>(path: P, format: ContainerFormat) -> Result<Self, ContainerError> {
        match format {
            ContainerFormat::Archive => Ok(ContainerWriter::Archive(ArchiveWriter::create(path)?)),
            #[cfg(feature = "netcdf")]
            ContainerFormat::NetCdf => Ok(ContainerWriter::NetCdf(NetCdfWriter::create(path)?)),
        }
    }

    /// Declare a container-wide dimension.
    pub fn add_dimension(&mut self, dim: &Dimension) -> Result<(), ContainerError> {
        match self {
            ContainerWriter::Archive(w) => w.add_dimension(dim),
            #[cfg(feature = "netcdf")]
            ContainerWriter::NetCdf(w) => w.add_dimension(dim),
        }
    }

    /// Create the group at `path` (names from the root, parent first).
    pub fn add_group(&mut self, path: &[String]) -> Result<(), ContainerError> {
        match self {
            ContainerWriter::Archive(w) => w.add_group(path),
            #[cfg(feature = "netcdf")]
            ContainerWriter::NetCdf(w) => w.add_group(path),
        }
    }

    /// Define and write a variable in the group at `group`.
    pub fn add_variable(
        &mut self,
        group: &[String],
        spec: VariableSpec,
        data: &VariableData,
    ) -> Result<(), ContainerError> {
        match self {
            ContainerWriter::Archive(w) => w.add_variable(group, spec, data),
            #[cfg(feature = "netcdf")]
            ContainerWriter::NetCdf(w) => w.add_variable(group, spec, data),
        }
    }

    /// Finalize the container; returns the file size in bytes.
    pub fn finish(self) -> Result<u64, ContainerError> {
        match self {
            ContainerWriter::Archive(w) => w.finish(),
            #[cfg(feature = "netcdf")]
            ContainerWriter::NetCdf(w) => w.finish(),
        }
    }
}

/// Number of elements in `shape`, `None` when the product overflows `usize`.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
}

/// Validate a variable's shape against its dimensions and element count.
pub(crate) fn check_shape(
    variable: &str,
    dims: &[(String, Option<usize>)],
    shape: &[usize],
    len: usize,
) -> Result<(), ContainerError> {
    let mismatch = |reason: String| ContainerError::ShapeMismatch {
        variable: variable.to_string(),
        reason,
    };

    if dims.len() != shape.len() {
        return Err(mismatch(format!(
            "{} dimensions but shape has {} extents",
            dims.len(),
            shape.len()
        )));
    }
    for ((name, size), extent) in dims.iter().zip(shape) {
        if let Some(size) = size {
            if size != extent {
                return Err(mismatch(format!(
                    "dimension '{}' has size {} but extent is {}",
                    name, size, extent
                )));
            }
        }
    }
    let expected = element_count(shape)
        .ok_or_else(|| mismatch(format!("shape {:?} overflows the element count", shape)))?;
    if expected != len {
        return Err(mismatch(format!(
            "shape {:?} needs {} values, got {}",
            shape, expected, len
        )));
    }
    Ok(())
}
