//! Declarative schema model and its JSON form.
//!
//! A schema file is a JSON object with one reserved key, `"name"`, holding the
//! naming tuple, and exactly two further sections: the header tree first, the
//! observation tree second. Each section is either a list of field tuples or
//! an object of nested groups.
//!
//! ```json
//! {
//!   "head": {
//!     "station": [
//!       ["station_id", ["Station_ID", "string", [], "Station identity", "-", "56691"]],
//!       ["-", ["Country", "string", [], "Country", "-", "China"]]
//!     ]
//!   },
//!   "observation": [
//!     ["Datetime", "string", [["Datetime", null]], "Datetime", "yyyy-mm-dd hh:mm:ss"],
//!     ["+", ["HGT", "ushort", [["Datetime", null], ["Dime_HGT_32", 32]], "Height", "m"]]
//!   ],
//!   "name": ["RADA", "MODI", "MOBS", "SUOB", "WNFB", "", "RRD", "METE", "Lraw", "", "FMT", true]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::dtype::NcType;

use super::compiler;
use super::entities::CompiledSchema;
use super::error::SchemaError;
use super::naming::NamingMetadata;

/// Reserved top-level key holding the naming tuple
pub const NAMING_KEY: &str = "name";

/// Marker string: use the output name as the source key
pub const MARKER_SAME_KEY: &str = "+";

/// Marker string: no source key, header default only
pub const MARKER_OMIT: &str = "-";

/// How a field resolves the record key it reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMarker {
    /// `"+"`: source key equals the output name
    UseOutputName,
    /// `"-"`: no source key; the compiled default is used (headers only)
    Omit,
    /// Any other string: explicit source key
    Explicit(String),
    /// Tuple without a leading marker; same as [`SourceMarker::UseOutputName`]
    Bare,
}

impl SourceMarker {
    /// Classify a marker string.
    pub fn parse(marker: &str) -> Self {
        match marker {
            MARKER_SAME_KEY => SourceMarker::UseOutputName,
            MARKER_OMIT => SourceMarker::Omit,
            key => SourceMarker::Explicit(key.to_string()),
        }
    }

    /// Resolve to a source key given the field's output name.
    pub fn resolve(&self, output_name: &str) -> Option<String> {
        match self {
            SourceMarker::UseOutputName | SourceMarker::Bare => Some(output_name.to_string()),
            SourceMarker::Explicit(key) => Some(key.clone()),
            SourceMarker::Omit => None,
        }
    }
}

/// A dimension as written inside a field tuple: name plus size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionDecl {
    /// Dimension name
    pub name: String,
    /// Fixed size, `None` for unlimited
    pub size: Option<usize>,
}

impl DimensionDecl {
    /// Fixed-size dimension
    pub fn fixed(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size: Some(size),
        }
    }

    /// Unlimited (record) dimension
    pub fn unlimited(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
        }
    }
}

/// One field tuple of the declarative schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Source-key marker
    pub marker: SourceMarker,
    /// Variable name in the container
    pub output_name: String,
    /// Variable type
    pub nc_type: NcType,
    /// Dimensions with sizes, outermost first
    pub dims: Vec<DimensionDecl>,
    /// `long_name` attribute
    pub description: String,
    /// `units` attribute
    pub unit: String,
    /// Header default value; `None` when the tuple has no sixth element
    pub default: Option<Value>,
}

impl FieldDecl {
    /// Bare field: reads the record key equal to its output name
    pub fn new(output_name: impl Into<String>, nc_type: NcType) -> Self {
        Self {
            marker: SourceMarker::Bare,
            output_name: output_name.into(),
            nc_type,
            dims: Vec::new(),
            description: String::new(),
            unit: String::new(),
            default: None,
        }
    }

    /// Set the source-key marker
    pub fn marker(mut self, marker: SourceMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Read from an explicit record key
    pub fn source(self, key: impl Into<String>) -> Self {
        self.marker(SourceMarker::Explicit(key.into()))
    }

    /// Omit the source key (header fields only)
    pub fn omitted(self) -> Self {
        self.marker(SourceMarker::Omit)
    }

    /// Append a dimension
    pub fn dim(mut self, dim: DimensionDecl) -> Self {
        self.dims.push(dim);
        self
    }

    /// Set the description (`long_name`)
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the unit
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the header default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parse a field tuple in either marker or bare form.
    pub(crate) fn from_json(value: &Value, group: &str) -> Result<Self, SchemaError> {
        let items = value.as_array().ok_or_else(|| invalid_field(group, "field must be a list"))?;

        match items.as_slice() {
            [Value::String(marker), Value::Array(body)] => {
                let mut field = Self::from_body(body, group)?;
                field.marker = SourceMarker::parse(marker);
                Ok(field)
            }
            [marker, Value::Array(_)] => Err(invalid_field(
                group,
                &format!("marker must be a string, found {}", marker),
            )),
            [Value::String(_), ..] => Self::from_body(items, group),
            _ => Err(invalid_field(
                group,
                &format!("unrecognized field tuple {}", value),
            )),
        }
    }

    /// Parse `(output_name, type, dims, description, unit[, default])`.
    fn from_body(body: &[Value], group: &str) -> Result<Self, SchemaError> {
        if body.len() != 5 && body.len() != 6 {
            return Err(invalid_field(
                group,
                &format!("expected 5 or 6 elements, found {}", body.len()),
            ));
        }

        let output_name = expect_str(&body[0], group, "output name")?;
        if output_name.is_empty() {
            return Err(invalid_field(group, "output name is empty"));
        }
        let type_name = expect_str(&body[1], group, "type")?;
        let nc_type = type_name
            .parse::<NcType>()
            .map_err(|source| SchemaError::UnknownType {
                group: group.to_string(),
                field: output_name.to_string(),
                source,
            })?;

        let dims = body[2]
            .as_array()
            .ok_or_else(|| invalid_dim(group, &format!("dims of '{}' must be a list", output_name)))?
            .iter()
            .map(|d| parse_dimension(d, group))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            marker: SourceMarker::Bare,
            output_name: output_name.to_string(),
            nc_type,
            dims,
            description: text_attribute(&body[3]),
            unit: text_attribute(&body[4]),
            default: body.get(5).cloned(),
        })
    }
}

/// A group of the declarative tree
#[derive(Debug, Clone, PartialEq)]
pub enum GroupDecl {
    /// Named subgroups, in declaration order
    Groups(Vec<(String, GroupDecl)>),
    /// Field tuples
    Fields(Vec<FieldDecl>),
}

impl GroupDecl {
    /// Number of fields in this subtree
    pub fn field_count(&self) -> usize {
        match self {
            GroupDecl::Groups(children) => children.iter().map(|(_, g)| g.field_count()).sum(),
            GroupDecl::Fields(fields) => fields.len(),
        }
    }

    pub(crate) fn from_json(value: &Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, child)| {
                    let child_path = format!("{}/{}", path, name);
                    Ok((name.clone(), Self::from_json(child, &child_path)?))
                })
                .collect::<Result<Vec<_>, SchemaError>>()
                .map(GroupDecl::Groups),
            Value::Array(items) => items
                .iter()
                .map(|item| FieldDecl::from_json(item, path))
                .collect::<Result<Vec<_>, _>>()
                .map(GroupDecl::Fields),
            _ => Err(SchemaError::InvalidGroup(path.to_string())),
        }
    }
}

/// Parsed but not yet compiled schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDeclaration {
    /// Data sections in declaration order: header first, observation second
    pub sections: Vec<(String, GroupDecl)>,
    /// Optional naming metadata for output file names
    pub naming: Option<NamingMetadata>,
}

impl SchemaDeclaration {
    /// Create an empty declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a data section
    pub fn section(mut self, name: impl Into<String>, group: GroupDecl) -> Self {
        self.sections.push((name.into(), group));
        self
    }

    /// Attach naming metadata
    pub fn naming(mut self, naming: NamingMetadata) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Parse a declaration from a JSON value.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let map: &Map<String, Value> = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let mut declaration = Self::new();
        for (key, section) in map {
            if key == NAMING_KEY {
                declaration.naming = Some(NamingMetadata::from_json(section)?);
            } else {
                let group = GroupDecl::from_json(section, key)?;
                declaration.sections.push((key.clone(), group));
            }
        }
        Ok(declaration)
    }

    /// Parse a declaration from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_json(&value)
    }

    /// Read and parse a JSON schema file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Compile into a [`CompiledSchema`].
    pub fn compile(&self) -> Result<CompiledSchema, SchemaError> {
        compiler::compile(self)
    }
}

fn parse_dimension(value: &Value, group: &str) -> Result<DimensionDecl, SchemaError> {
    match value.as_array().map(Vec::as_slice) {
        Some([Value::String(name), Value::Null]) => Ok(DimensionDecl::unlimited(name.clone())),
        Some([Value::String(name), Value::Number(n)]) => {
            let size = n
                .as_u64()
                .and_then(|s| usize::try_from(s).ok())
                .filter(|s| *s > 0)
                .ok_or_else(|| {
                    invalid_dim(group, &format!("size of '{}' must be a positive integer", name))
                })?;
            Ok(DimensionDecl::fixed(name.clone(), size))
        }
        _ => Err(invalid_dim(
            group,
            &format!("expected [name, size|null], found {}", value),
        )),
    }
}

fn expect_str<'a>(value: &'a Value, group: &str, what: &str) -> Result<&'a str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| invalid_field(group, &format!("{} must be a string, found {}", what, value)))
}

/// Descriptions and units are free text; non-string scalars are stringified.
fn text_attribute(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn invalid_field(group: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidField {
        group: group.to_string(),
        reason: reason.to_string(),
    }
}

fn invalid_dim(group: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidDimension {
        group: group.to_string(),
        reason: reason.to_string(),
    }
}
