//! `manifest.json` of the archive container.
//!
//! The manifest carries the full structure of a container; variable payloads
//! live in separate entries referenced by path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dtype::NcType;
use crate::schema::PATH_SEPARATOR;

/// Manifest format version
pub const MANIFEST_VERSION: &str = "1.0";

/// Top-level manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub format_version: String,
    /// Container-wide dimensions in declaration order
    pub dimensions: Vec<ManifestDimension>,
    /// Root group; holds the section groups
    pub root: ManifestGroup,
}

impl Manifest {
    pub(crate) fn new() -> Self {
        Self {
            format_version: MANIFEST_VERSION.to_string(),
            dimensions: Vec::new(),
            root: ManifestGroup::new(""),
        }
    }

    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&ManifestDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Find a group by slash-separated path; the empty path is the root.
    pub fn group(&self, path: &str) -> Option<&ManifestGroup> {
        split_path(path).try_fold(&self.root, |group, name| group.child(name))
    }

    pub(crate) fn group_mut(&mut self, path: &[String]) -> Option<&mut ManifestGroup> {
        let mut group = &mut self.root;
        for name in path {
            group = group.groups.iter_mut().find(|g| &g.name == name)?;
        }
        Some(group)
    }

    /// Find a variable by slash-separated path, e.g. `head/head_grp1/LAT`.
    pub fn variable(&self, path: &str) -> Option<&ManifestVariable> {
        let (group, name) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((group, name)) => (group, name),
            None => ("", path),
        };
        self.group(group)?.variables.iter().find(|v| v.name == name)
    }

    /// Every variable with its full path, depth-first
    pub fn variables(&self) -> Vec<(String, &ManifestVariable)> {
        let mut out = Vec::new();
        self.root.collect_variables("", &mut out);
        out
    }
}

/// A dimension entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDimension {
    /// Dimension name
    pub name: String,
    /// Declared size, `None` for unlimited
    pub size: Option<usize>,
    /// Actual length; equals `size` for fixed dimensions
    pub length: usize,
}

/// A group and its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestGroup {
    /// Group name; empty for the root
    pub name: String,
    /// Child groups in creation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ManifestGroup>,
    /// Variables in creation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ManifestVariable>,
}

impl ManifestGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Direct child group by name
    pub fn child(&self, name: &str) -> Option<&ManifestGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name) || self.variables.iter().any(|v| v.name == name)
    }

    fn collect_variables<'a>(&'a self, path: &str, out: &mut Vec<(String, &'a ManifestVariable)>) {
        for var in &self.variables {
            out.push((join_path(path, &var.name), var));
        }
        for group in &self.groups {
            group.collect_variables(&join_path(path, &group.name), out);
        }
    }
}

/// A variable entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestVariable {
    /// Variable name
    pub name: String,
    /// Element type
    #[serde(rename = "type")]
    pub nc_type: NcType,
    /// Element type tag (`i1`, `u2`, `f8`, `str`, ...)
    pub tag: String,
    /// Dimension names, outermost first
    pub dims: Vec<String>,
    /// Extent along each dimension
    pub shape: Vec<usize>,
    /// Text attributes (`long_name`, `units`)
    pub attributes: BTreeMap<String, String>,
    /// Deflate level of the data entry, `None` when stored
    pub compression: Option<u32>,
    /// Archive entry holding the values
    pub entry: String,
}

impl ManifestVariable {
    /// Number of elements, `None` if the shape overflows `usize`
    pub fn element_count(&self) -> Option<usize> {
        super::element_count(&self.shape)
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, name)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}
