//! NetCDF-4 backend through libnetcdf.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::data::VariableData;
use super::error::ContainerError;
use super::manifest::join_path;
use super::{check_shape, VariableSpec};
use crate::schema::Dimension;

/// Writer for NetCDF-4 files
///
/// The file is written in place. Dropping an unfinished writer closes and
/// deletes it.
pub struct NetCdfWriter {
    output_path: PathBuf,
    file: Option<netcdf::FileMut>,
    dimensions: Vec<Dimension>,
}

macro_rules! put_numeric {
    ($file:expr, $path:expr, $dims:expr, $spec:expr, $values:expr, $ty:ty) => {{
        let mut var = $file.add_variable::<$ty>($path, $dims)?;
        if let Some(level) = $spec.compression {
            var.set_compression(level as i32, true)?;
        }
        for (key, value) in &$spec.attributes {
            var.put_attribute(key, value.as_str())?;
        }
        if !$values.is_empty() {
            let start = vec![0usize; $spec.shape.len()];
            var.put_values($values.as_slice(), (start.as_slice(), $spec.shape.as_slice()))?;
        }
    }};
}

impl NetCdfWriter {
    /// Create (or truncate) a NetCDF-4 file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let output_path = path.as_ref().to_path_buf();
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = netcdf::create(&output_path)?;
        Ok(Self {
            output_path,
            file: Some(file),
            dimensions: Vec::new(),
        })
    }

    fn file_mut(&mut self) -> Result<&mut netcdf::FileMut, ContainerError> {
        self.file
            .as_mut()
            .ok_or_else(|| ContainerError::InvalidFormat("file already closed".to_string()))
    }

    /// Declare a root-level dimension.
    pub fn add_dimension(&mut self, dim: &Dimension) -> Result<(), ContainerError> {
        if self.dimensions.iter().any(|d| d.name == dim.name) {
            return Err(ContainerError::DuplicateDimension(dim.name.clone()));
        }
        let file = self.file_mut()?;
        match dim.size {
            Some(size) => file.add_dimension(&dim.name, size)?,
            None => file.add_unlimited_dimension(&dim.name)?,
        };
        self.dimensions.push(dim.clone());
        Ok(())
    }

    /// Create the group at `path`.
    pub fn add_group(&mut self, path: &[String]) -> Result<(), ContainerError> {
        let full = path.join("/");
        self.file_mut()?.add_group(&full)?;
        Ok(())
    }

    /// Define and write one variable into the group at `group`.
    pub fn add_variable(
        &mut self,
        group: &[String],
        spec: VariableSpec,
        data: &VariableData,
    ) -> Result<(), ContainerError> {
        let var_path = join_path(&group.join("/"), &spec.name);
        let dims: Vec<(String, Option<usize>)> = spec
            .dims
            .iter()
            .map(|name| {
                self.dimensions
                    .iter()
                    .find(|d| &d.name == name)
                    .map(|d| (d.name.clone(), d.size))
                    .ok_or_else(|| ContainerError::UnknownDimension {
                        variable: var_path.clone(),
                        dimension: name.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;
        check_shape(&var_path, &dims, &spec.shape, data.len())?;

        let dim_names: Vec<&str> = spec.dims.iter().map(String::as_str).collect();
        let file = self.file_mut()?;
        match data {
            VariableData::Byte(v) => put_numeric!(file, &var_path, &dim_names, spec, v, i8),
            VariableData::UByte(v) => put_numeric!(file, &var_path, &dim_names, spec, v, u8),
            VariableData::Short(v) => put_numeric!(file, &var_path, &dim_names, spec, v, i16),
            VariableData::UShort(v) => put_numeric!(file, &var_path, &dim_names, spec, v, u16),
            VariableData::Int(v) => put_numeric!(file, &var_path, &dim_names, spec, v, i32),
            VariableData::UInt(v) => put_numeric!(file, &var_path, &dim_names, spec, v, u32),
            VariableData::Int64(v) => put_numeric!(file, &var_path, &dim_names, spec, v, i64),
            VariableData::UInt64(v) => put_numeric!(file, &var_path, &dim_names, spec, v, u64),
            VariableData::Float(v) => put_numeric!(file, &var_path, &dim_names, spec, v, f32),
            VariableData::Double(v) => put_numeric!(file, &var_path, &dim_names, spec, v, f64),
            VariableData::String(v) => {
                let mut var = file.add_string_variable(&var_path, &dim_names)?;
                for (key, value) in &spec.attributes {
                    var.put_attribute(key, value.as_str())?;
                }
                for (flat, text) in v.iter().enumerate() {
                    let index = unravel(flat, &spec.shape);
                    var.put_string(text, index.as_slice())?;
                }
            }
        }
        debug!("wrote {} ({} {} values)", var_path, data.len(), data.nc_type());
        Ok(())
    }

    /// Close the file and return its size in bytes.
    ///
    /// A failed close removes the file and returns the error.
    pub fn finish(mut self) -> Result<u64, ContainerError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| ContainerError::InvalidFormat("file already closed".to_string()))?;
        if let Err(e) = file.close() {
            self.remove_output();
            return Err(e.into());
        }
        Ok(fs::metadata(&self.output_path)?.len())
    }

    fn remove_output(&self) {
        if let Err(e) = fs::remove_file(&self.output_path) {
            warn!(
                "failed to remove incomplete file {}: {}",
                self.output_path.display(),
                e
            );
        }
    }
}

impl Drop for NetCdfWriter {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            self.remove_output();
        }
    }
}

/// Row-major multi-index of flat element `flat`
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (slot, extent) in index.iter_mut().zip(shape).rev() {
        if *extent > 0 {
            *slot = flat % extent;
            flat /= extent;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unravel_row_major() {
        assert_eq!(unravel(0, &[2, 3]), vec![0, 0]);
        assert_eq!(unravel(4, &[2, 3]), vec![1, 1]);
        assert_eq!(unravel(5, &[2, 3]), vec![1, 2]);
        assert_eq!(unravel(0, &[]), Vec::<usize>::new());
    }
}
