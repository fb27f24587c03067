//! Schema compiler: declarative tree in, [`CompiledSchema`] out.
//!
//! Each group is compiled by a pure recursive function that returns a fresh
//! subtree; nothing is shared or mutated between sibling groups. Dimension
//! declarations are collected in a second pass into a set keyed by name, so a
//! dimension repeated across the tree appears once and a name redeclared with
//! another size is rejected.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::declaration::{DimensionDecl, FieldDecl, GroupDecl, SchemaDeclaration, SourceMarker};
use super::entities::{
    CompiledSchema, DataClass, Dimension, FieldSpec, NamedNode, SchemaNode, PATH_SEPARATOR,
};
use super::error::SchemaError;

/// Compile a declaration.
///
/// # Errors
///
/// Fails with [`SchemaError`] when the declaration does not have exactly two
/// data sections, a section has no fields, a group or field name is not a
/// single path segment, an observation field uses the omit marker, a group
/// repeats an output name, or a dimension is redeclared with a different size.
pub fn compile(declaration: &SchemaDeclaration) -> Result<CompiledSchema, SchemaError> {
    let [(header_name, header_decl), (observation_name, observation_decl)] =
        declaration.sections.as_slice()
    else {
        return Err(SchemaError::SectionCount {
            found: declaration.sections.len(),
            names: declaration
                .sections
                .iter()
                .map(|(name, _)| name.clone())
                .collect(),
        });
    };

    for (name, decl) in &declaration.sections {
        if decl.field_count() == 0 {
            return Err(SchemaError::EmptySection(name.clone()));
        }
    }

    let header = compile_group(header_name, header_decl, DataClass::Header, header_name)?;
    let observation = compile_group(
        observation_name,
        observation_decl,
        DataClass::Observation,
        observation_name,
    )?;

    let mut dimensions = DimensionSet::default();
    dimensions.collect(header_decl)?;
    dimensions.collect(observation_decl)?;

    let data_mapping: BTreeMap<String, String> = header
        .fields()
        .into_iter()
        .chain(observation.fields())
        .filter_map(|(_, field)| {
            field
                .source_key
                .as_ref()
                .map(|key| (field.output_name.clone(), key.clone()))
        })
        .collect();

    debug!(
        "compiled schema: {} header fields, {} observation fields, dimensions [{}]",
        header.field_count(),
        observation.field_count(),
        dimensions
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(CompiledSchema {
        header,
        observation,
        dimensions: dimensions.dims,
        data_mapping,
        naming: declaration.naming.clone(),
    })
}

fn compile_group(
    name: &str,
    decl: &GroupDecl,
    class: DataClass,
    path: &str,
) -> Result<NamedNode, SchemaError> {
    let parent = path
        .strip_suffix(name)
        .map(|p| p.trim_end_matches(PATH_SEPARATOR))
        .unwrap_or("");
    check_name(name, parent)?;
    let node = match decl {
        GroupDecl::Groups(children) => SchemaNode::Groups(
            children
                .iter()
                .map(|(child_name, child)| {
                    let child_path = format!("{}/{}", path, child_name);
                    compile_group(child_name, child, class, &child_path)
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        GroupDecl::Fields(fields) => SchemaNode::Fields(compile_fields(fields, class, path)?),
    };

    Ok(NamedNode {
        name: name.to_string(),
        node,
    })
}

fn compile_fields(
    fields: &[FieldDecl],
    class: DataClass,
    group: &str,
) -> Result<Vec<FieldSpec>, SchemaError> {
    let mut seen = HashSet::new();
    fields
        .iter()
        .map(|decl| {
            if !seen.insert(decl.output_name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    group: group.to_string(),
                    field: decl.output_name.clone(),
                });
            }
            compile_field(decl, class, group)
        })
        .collect()
}

fn compile_field(decl: &FieldDecl, class: DataClass, group: &str) -> Result<FieldSpec, SchemaError> {
    check_name(&decl.output_name, group)?;
    if let Some(dim) = decl
        .dims
        .iter()
        .find(|d| d.name.is_empty() || d.name.contains(PATH_SEPARATOR))
    {
        return Err(SchemaError::InvalidDimension {
            group: group.to_string(),
            reason: format!("'{}' is not a valid dimension name", dim.name),
        });
    }
    if let SourceMarker::Explicit(key) = &decl.marker {
        if key.is_empty() {
            return Err(SchemaError::InvalidField {
                group: group.to_string(),
                reason: format!("'{}' has an empty source key", decl.output_name),
            });
        }
    }

    let default = match class {
        DataClass::Header => Some(decl.default.clone().unwrap_or_default()),
        DataClass::Observation => {
            if decl.marker == SourceMarker::Omit {
                return Err(SchemaError::UnsupportedOmission {
                    group: group.to_string(),
                    field: decl.output_name.clone(),
                });
            }
            if decl.default.is_some() {
                return Err(SchemaError::InvalidField {
                    group: group.to_string(),
                    reason: format!(
                        "observation field '{}' takes no default value",
                        decl.output_name
                    ),
                });
            }
            None
        }
    };

    Ok(FieldSpec {
        source_key: decl.marker.resolve(&decl.output_name),
        output_name: decl.output_name.clone(),
        nc_type: decl.nc_type,
        dims: decl.dims.iter().map(|d| d.name.clone()).collect(),
        description: decl.description.clone(),
        unit: decl.unit.clone(),
        default,
    })
}

/// Group and field names become path segments, so they may not be empty or
/// contain the separator.
fn check_name(name: &str, group: &str) -> Result<(), SchemaError> {
    if name.is_empty() || name.contains(PATH_SEPARATOR) {
        return Err(SchemaError::InvalidName {
            group: group.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Dimensions keyed by name, first-seen order
#[derive(Debug, Default)]
struct DimensionSet {
    dims: Vec<Dimension>,
}

impl DimensionSet {
    fn insert(&mut self, decl: &DimensionDecl) -> Result<(), SchemaError> {
        match self.dims.iter().find(|d| d.name == decl.name) {
            Some(existing) if existing.size == decl.size => Ok(()),
            Some(existing) => Err(SchemaError::ConflictingDimension {
                name: decl.name.clone(),
                existing: existing.size_label(),
                found: Dimension::new(decl.name.clone(), decl.size).size_label(),
            }),
            None => {
                self.dims.push(Dimension::new(decl.name.clone(), decl.size));
                Ok(())
            }
        }
    }

    fn collect(&mut self, decl: &GroupDecl) -> Result<(), SchemaError> {
        match decl {
            GroupDecl::Groups(children) => {
                for (_, child) in children {
                    self.collect(child)?;
                }
            }
            GroupDecl::Fields(fields) => {
                for dim in fields.iter().flat_map(|f| f.dims.iter()) {
                    self.insert(dim)?;
                }
            }
        }
        Ok(())
    }
}
