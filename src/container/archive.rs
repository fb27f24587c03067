//! Portable archive backend.
//!
//! ```text
//! output.nc (ZIP archive)
//! ├── mimetype                       # uncompressed, first entry
//! ├── data/<group path>/<var>.bin    # numeric: Deflate, strings: Stored
//! └── manifest.json                  # dimensions, groups, variables (Deflate)
//! ```
//!
//! The archive is assembled in a temporary file next to the destination and
//! moved into place on [`ArchiveWriter::finish`]. Dropping an unfinished
//! writer removes the temporary file, so a failed render leaves nothing at
//! the destination path.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::data::VariableData;
use super::error::ContainerError;
use super::manifest::{join_path, Manifest, ManifestDimension, ManifestGroup, ManifestVariable};
use super::{check_shape, VariableSpec};
use crate::schema::Dimension;

/// MIME type stored in the `mimetype` entry
pub const CONTAINER_MIMETYPE: &str = "application/vnd.obs2nc.container";

/// Name of the first archive entry
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// Name of the manifest entry
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Prefix of variable data entries
pub const DATA_PREFIX: &str = "data";

/// Writer for the archive container
pub struct ArchiveWriter {
    output_path: PathBuf,
    zip_writer: ZipWriter<BufWriter<NamedTempFile>>,
    manifest: Manifest,
}

impl ArchiveWriter {
    /// Start a new archive destined for `path`.
    ///
    /// Parent directories are created as needed. Nothing appears at `path`
    /// until [`ArchiveWriter::finish`] succeeds; an existing file there is
    /// replaced at that point.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let output_path = path.as_ref().to_path_buf();
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let temp = tempfile::Builder::new()
            .prefix(".obs2nc-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;
        let mut zip_writer = ZipWriter::new(BufWriter::new(temp));

        zip_writer.start_file(MIMETYPE_ENTRY, entry_options(None))?;
        zip_writer.write_all(CONTAINER_MIMETYPE.as_bytes())?;

        Ok(Self {
            output_path,
            zip_writer,
            manifest: Manifest::new(),
        })
    }

    /// Declare a container-wide dimension.
    pub fn add_dimension(&mut self, dim: &Dimension) -> Result<(), ContainerError> {
        if self.manifest.dimension(&dim.name).is_some() {
            return Err(ContainerError::DuplicateDimension(dim.name.clone()));
        }
        self.manifest.dimensions.push(ManifestDimension {
            name: dim.name.clone(),
            size: dim.size,
            length: dim.size.unwrap_or(0),
        });
        Ok(())
    }

    /// Create the group at `path`; its parent must already exist.
    pub fn add_group(&mut self, path: &[String]) -> Result<(), ContainerError> {
        let Some((name, parent_path)) = path.split_last() else {
            return Err(ContainerError::DuplicateEntry("/".to_string()));
        };
        let parent = self
            .manifest
            .group_mut(parent_path)
            .ok_or_else(|| ContainerError::UnknownGroup(parent_path.join("/")))?;
        if parent.contains(name) {
            return Err(ContainerError::DuplicateEntry(path.join("/")));
        }
        parent.groups.push(ManifestGroup::new(name.clone()));
        Ok(())
    }

    /// Write one variable into the group at `group`.
    pub fn add_variable(
        &mut self,
        group: &[String],
        spec: VariableSpec,
        data: &VariableData,
    ) -> Result<(), ContainerError> {
        let group_path = group.join("/");
        let var_path = join_path(&group_path, &spec.name);

        let dims: Vec<(String, Option<usize>)> = spec
            .dims
            .iter()
            .map(|name| {
                self.manifest
                    .dimension(name)
                    .map(|d| (d.name.clone(), d.size))
                    .ok_or_else(|| ContainerError::UnknownDimension {
                        variable: var_path.clone(),
                        dimension: name.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;
        check_shape(&var_path, &dims, &spec.shape, data.len())?;

        let nc_type = data.nc_type();
        let compression = if nc_type.is_string() {
            None
        } else {
            spec.compression
        };
        let entry = format!("{}/{}.bin", DATA_PREFIX, var_path);

        let target = self
            .manifest
            .group_mut(group)
            .ok_or_else(|| ContainerError::UnknownGroup(group_path.clone()))?;
        if target.contains(&spec.name) {
            return Err(ContainerError::DuplicateEntry(var_path));
        }
        target.variables.push(ManifestVariable {
            name: spec.name,
            nc_type,
            tag: nc_type.tag().to_string(),
            dims: spec.dims,
            shape: spec.shape.clone(),
            attributes: spec.attributes,
            compression,
            entry: entry.clone(),
        });

        for ((name, size), extent) in dims.iter().zip(&spec.shape) {
            if size.is_none() {
                if let Some(dim) = self.manifest.dimensions.iter_mut().find(|d| &d.name == name) {
                    dim.length = dim.length.max(*extent);
                }
            }
        }

        self.zip_writer.start_file(entry.as_str(), entry_options(compression))?;
        self.zip_writer.write_all(&data.encode()?)?;
        debug!("wrote {} ({} {} values)", var_path, data.len(), nc_type);
        Ok(())
    }

    /// Write the manifest and move the archive into place.
    ///
    /// Returns the final file size in bytes.
    pub fn finish(mut self) -> Result<u64, ContainerError> {
        let json = serde_json::to_vec_pretty(&self.manifest)?;
        self.zip_writer.start_file(MANIFEST_ENTRY, entry_options(Some(6)))?;
        self.zip_writer.write_all(&json)?;

        let buf_writer = self.zip_writer.finish()?;
        let temp = buf_writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        let file = temp.persist(&self.output_path).map_err(|e| e.error)?;

        Ok(file.metadata()?.len())
    }
}

fn entry_options(compression: Option<u32>) -> SimpleFileOptions {
    let options = SimpleFileOptions::default()
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);
    match compression {
        Some(level) => options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level))),
        None => options.compression_method(CompressionMethod::Stored),
    }
}

/// Reader for archive containers
pub struct ArchiveReader {
    archive: ZipArchive<BufReader<File>>,
    manifest: Manifest,
}

impl ArchiveReader {
    /// Open an archive and load its manifest.
    ///
    /// Fails with [`ContainerError::InvalidFormat`] when the first entry is
    /// not an uncompressed `mimetype` with the expected content.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let file = File::open(path.as_ref())?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        {
            let mut first = archive.by_index(0)?;
            if first.name() != MIMETYPE_ENTRY {
                return Err(ContainerError::InvalidFormat(format!(
                    "first entry must be '{}', found '{}'",
                    MIMETYPE_ENTRY,
                    first.name()
                )));
            }
            if first.compression() != CompressionMethod::Stored {
                return Err(ContainerError::InvalidFormat(
                    "mimetype entry must be stored uncompressed".to_string(),
                ));
            }
            let mut content = String::new();
            first.read_to_string(&mut content)?;
            if content != CONTAINER_MIMETYPE {
                return Err(ContainerError::InvalidFormat(format!(
                    "unexpected mimetype '{}'",
                    content
                )));
            }
        }

        let manifest: Manifest = {
            let mut entry = archive.by_name(MANIFEST_ENTRY)?;
            let mut json = Vec::new();
            entry.read_to_end(&mut json)?;
            serde_json::from_slice(&json)?
        };

        Ok(Self { archive, manifest })
    }

    /// Container structure
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Container-wide dimensions
    pub fn dimensions(&self) -> &[ManifestDimension] {
        &self.manifest.dimensions
    }

    /// Read and decode a variable by path, e.g. `observation/T`.
    pub fn read_variable(&mut self, path: &str) -> Result<VariableData, ContainerError> {
        let var = self
            .manifest
            .variable(path)
            .ok_or_else(|| ContainerError::VariableNotFound(path.to_string()))?;

        let mut entry = self.archive.by_name(&var.entry)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        let count = var.element_count().ok_or_else(|| {
            ContainerError::InvalidFormat(format!(
                "variable '{}': shape {:?} overflows",
                path, var.shape
            ))
        })?;
        VariableData::decode(var.nc_type, &bytes, count).map_err(|e| {
            ContainerError::InvalidFormat(format!("variable '{}': {}", path, e))
        })
    }
}
