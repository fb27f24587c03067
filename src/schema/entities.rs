use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dtype::NcType;

use super::naming::NamingMetadata;

/// Separator between group names in a group path
pub const PATH_SEPARATOR: char = '/';

/// A named container axis
///
/// Identity is `(name, size)`; `size == None` is the unlimited record axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name
    pub name: String,
    /// Fixed size, `None` for unlimited
    pub size: Option<usize>,
}

impl Dimension {
    /// Create a dimension
    pub fn new(name: impl Into<String>, size: Option<usize>) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Returns true for the unlimited dimension.
    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.size.is_none()
    }

    /// Human-readable size
    pub fn size_label(&self) -> String {
        match self.size {
            Some(size) => size.to_string(),
            None => "unlimited".to_string(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.size_label())
    }
}

/// Which tree a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataClass {
    /// One value per file, taken from the first record or a default
    Header,
    /// One value per record, stacked along the leading dimension
    Observation,
}

/// A compiled header or observation variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Record key to read; `None` only for header fields that use their default
    pub source_key: Option<String>,
    /// Variable name in the container
    pub output_name: String,
    /// Variable type
    pub nc_type: NcType,
    /// Dimension names, outermost first; sizes live in the schema's dimension set
    pub dims: Vec<String>,
    /// `long_name` attribute
    pub description: String,
    /// `units` attribute
    pub unit: String,
    /// Header default value; always `None` for observation fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Compiled group tree node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Nested groups
    Groups(Vec<NamedNode>),
    /// Variables of this group
    Fields(Vec<FieldSpec>),
}

/// A named group of the compiled tree
#[derive(Debug, Clone, PartialEq)]
pub struct NamedNode {
    /// Group name
    pub name: String,
    /// Group contents
    pub node: SchemaNode,
}

impl NamedNode {
    /// Number of fields in this subtree
    pub fn field_count(&self) -> usize {
        match &self.node {
            SchemaNode::Groups(children) => children.iter().map(NamedNode::field_count).sum(),
            SchemaNode::Fields(fields) => fields.len(),
        }
    }

    /// Returns true if no field exists anywhere below this group.
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// All fields depth-first, paired with their full group path (`a/b/c`).
    pub fn fields(&self) -> Vec<(String, &FieldSpec)> {
        let mut out = Vec::new();
        self.collect_fields(&self.name, &mut out);
        out
    }

    fn collect_fields<'a>(&'a self, path: &str, out: &mut Vec<(String, &'a FieldSpec)>) {
        match &self.node {
            SchemaNode::Groups(children) => {
                for child in children {
                    let child_path = format!("{}{}{}", path, PATH_SEPARATOR, child.name);
                    child.collect_fields(&child_path, out);
                }
            }
            SchemaNode::Fields(fields) => {
                out.extend(fields.iter().map(|f| (path.to_string(), f)));
            }
        }
    }

    /// Find a field by `group/path/output_name`.
    pub fn find(&self, field_path: &str) -> Option<&FieldSpec> {
        self.fields()
            .into_iter()
            .find(|(group, field)| field_key(group, &field.output_name) == field_path)
            .map(|(_, field)| field)
    }
}

/// Full path of a field: its group path joined with its output name
pub fn field_key(group_path: &str, output_name: &str) -> String {
    format!("{}{}{}", group_path, PATH_SEPARATOR, output_name)
}

/// Output of the schema compiler
///
/// Built once per generator; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub(crate) header: NamedNode,
    pub(crate) observation: NamedNode,
    pub(crate) dimensions: Vec<Dimension>,
    pub(crate) data_mapping: BTreeMap<String, String>,
    pub(crate) naming: Option<NamingMetadata>,
}

impl CompiledSchema {
    /// Header group tree; its root is the header section
    pub fn header(&self) -> &NamedNode {
        &self.header
    }

    /// Observation group tree; its root is the observation section
    pub fn observation(&self) -> &NamedNode {
        &self.observation
    }

    /// Deduplicated dimensions in first-seen order
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Output name to source key, for every field that has a source key
    pub fn data_mapping(&self) -> &BTreeMap<String, String> {
        &self.data_mapping
    }

    /// Naming metadata, if the schema declared one
    pub fn naming(&self) -> Option<&NamingMetadata> {
        self.naming.as_ref()
    }

    /// Total number of variables across both trees
    pub fn variable_count(&self) -> usize {
        self.header.field_count() + self.observation.field_count()
    }
}
