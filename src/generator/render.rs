//! Container renderer.
//!
//! Rendering runs in two phases. Planning resolves header values, stacks
//! observation values, and converts everything into typed variable data
//! without touching the filesystem. Writing then materializes dimensions,
//! groups, and variables in one pass over the plan.

use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use super::config::GeneratorConfig;
use super::error::RenderError;
use super::headers::{fill_headers, HeaderValues, RenderOptions};
use super::stats::RenderStats;
use crate::container::{
    element_count, ContainerWriter, VariableData, VariableSpec, ATTR_LONG_NAME, ATTR_UNITS,
};
use crate::records::Record;
use crate::schema::{field_key, CompiledSchema, DataClass, FieldSpec, NamedNode, SchemaNode};

/// One group to create, with its variables
#[derive(Debug)]
struct GroupPlan {
    path: Vec<String>,
    variables: Vec<(VariableSpec, VariableData)>,
}

/// Render `batch` into a container at `path`.
pub(crate) fn render(
    schema: &CompiledSchema,
    config: &GeneratorConfig,
    path: &Path,
    batch: &[Record],
    options: &RenderOptions,
) -> Result<RenderStats, RenderError> {
    if batch.is_empty() {
        return Err(RenderError::EmptyBatch);
    }
    info!(
        "rendering {} records ({} .. {}) to {}",
        batch.len(),
        options.start_time.as_deref().unwrap_or("?"),
        options.end_time.as_deref().unwrap_or("?"),
        path.display()
    );

    let headers = fill_headers(schema, batch, options)?;
    let mut planner = Planner {
        schema,
        compression: config.compression(),
        batch,
        headers: &headers,
        groups: Vec::new(),
    };
    planner.plan_tree(schema.header(), DataClass::Header, &[])?;
    planner.plan_tree(schema.observation(), DataClass::Observation, &[])?;
    let groups = planner.groups;

    let mut writer =
        ContainerWriter::create(path, config.format).map_err(RenderError::ContainerCreate)?;
    for dim in schema.dimensions() {
        debug!("dimension {}", dim);
        writer.add_dimension(dim)?;
    }

    let mut variables = 0;
    for group in &groups {
        writer.add_group(&group.path)?;
        for (spec, data) in &group.variables {
            writer.add_variable(&group.path, spec.clone(), data)?;
            variables += 1;
        }
    }
    let bytes_written = writer.finish()?;
    info!("wrote {} ({} bytes)", path.display(), bytes_written);

    Ok(RenderStats {
        path: path.to_path_buf(),
        records: batch.len(),
        dimensions: schema.dimensions().len(),
        groups: groups.len(),
        variables,
        bytes_written,
    })
}

struct Planner<'a> {
    schema: &'a CompiledSchema,
    compression: Option<u32>,
    batch: &'a [Record],
    headers: &'a HeaderValues,
    groups: Vec<GroupPlan>,
}

impl Planner<'_> {
    /// Depth-first; groups without any field below them are not created.
    fn plan_tree(
        &mut self,
        node: &NamedNode,
        class: DataClass,
        parent: &[String],
    ) -> Result<(), RenderError> {
        if node.is_empty() {
            return Ok(());
        }
        let mut path = parent.to_vec();
        path.push(node.name.clone());

        match &node.node {
            SchemaNode::Groups(children) => {
                self.groups.push(GroupPlan {
                    path: path.clone(),
                    variables: Vec::new(),
                });
                for child in children {
                    self.plan_tree(child, class, &path)?;
                }
            }
            SchemaNode::Fields(fields) => {
                let group_path = path.join("/");
                let variables = fields
                    .iter()
                    .map(|field| {
                        let variable = field_key(&group_path, &field.output_name);
                        let (shape, data) = match class {
                            DataClass::Header => self.header_data(&variable, field)?,
                            DataClass::Observation => self.observation_data(&variable, field)?,
                        };
                        Ok::<_, RenderError>((self.variable_spec(field, shape), data))
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                self.groups.push(GroupPlan { path, variables });
            }
        }
        Ok(())
    }

    fn variable_spec(&self, field: &FieldSpec, shape: Vec<usize>) -> VariableSpec {
        VariableSpec {
            name: field.output_name.clone(),
            dims: field.dims.clone(),
            shape,
            attributes: [
                (ATTR_LONG_NAME.to_string(), field.description.clone()),
                (ATTR_UNITS.to_string(), field.unit.clone()),
            ]
            .into_iter()
            .collect(),
            compression: if field.nc_type.is_string() {
                None
            } else {
                self.compression
            },
        }
    }

    fn dim_sizes(&self, field: &FieldSpec) -> Vec<Option<usize>> {
        field
            .dims
            .iter()
            .map(|name| self.schema.dimension(name).and_then(|d| d.size))
            .collect()
    }

    fn header_data(
        &self,
        variable: &str,
        field: &FieldSpec,
    ) -> Result<(Vec<usize>, VariableData), RenderError> {
        let value = self.headers.get(variable).unwrap_or(&Value::Null);
        let mut elements = Vec::new();
        flatten(value, &mut elements);

        let sizes = self.dim_sizes(field);
        let fixed_dims: Vec<usize> = sizes.iter().flatten().copied().collect();
        let fixed = element_count(&fixed_dims).ok_or_else(|| RenderError::ShapeMismatch {
            variable: variable.to_string(),
            reason: format!("dimension sizes {:?} overflow the element count", fixed_dims),
        })?;
        let unlimited = sizes.iter().filter(|s| s.is_none()).count();

        let shape: Vec<usize> = match unlimited {
            0 if elements.len() == fixed => fixed_dims,
            1 if fixed > 0 && elements.len() % fixed == 0 => sizes
                .iter()
                .map(|s| s.unwrap_or(elements.len() / fixed))
                .collect(),
            _ => {
                return Err(RenderError::ShapeMismatch {
                    variable: variable.to_string(),
                    reason: format!(
                        "{} values do not fit dimensions [{}]",
                        elements.len(),
                        field.dims.join(", ")
                    ),
                })
            }
        };

        let data = convert(variable, field, &elements)?;
        Ok((shape, data))
    }

    fn observation_data(
        &self,
        variable: &str,
        field: &FieldSpec,
    ) -> Result<(Vec<usize>, VariableData), RenderError> {
        let mismatch = |reason: String| RenderError::ShapeMismatch {
            variable: variable.to_string(),
            reason,
        };

        let sizes = self.dim_sizes(field);
        let Some((leading, trailing)) = sizes.split_first() else {
            return Err(mismatch(
                "observation variables need a leading record dimension".to_string(),
            ));
        };
        if let Some(size) = leading {
            if *size != self.batch.len() {
                return Err(mismatch(format!(
                    "leading dimension '{}' has size {} but the batch has {} records",
                    field.dims[0],
                    size,
                    self.batch.len()
                )));
            }
        }
        let trailing: Vec<usize> = trailing
            .iter()
            .zip(&field.dims[1..])
            .map(|(size, name)| {
                size.ok_or_else(|| {
                    mismatch(format!("trailing dimension '{}' must have a fixed size", name))
                })
            })
            .collect::<Result<_, _>>()?;
        let per_record = element_count(&trailing)
            .and_then(|n| n.checked_mul(self.batch.len()).map(|_| n))
            .ok_or_else(|| {
                mismatch(format!(
                    "dimension sizes {:?} overflow the element count",
                    trailing
                ))
            })?;

        let key = field.source_key.as_deref().unwrap_or(&field.output_name);
        let mut elements = Vec::new();
        for (index, record) in self.batch.iter().enumerate() {
            let value = record.get(key).ok_or_else(|| RenderError::MissingField {
                field: variable.to_string(),
                key: key.to_string(),
                record: index,
            })?;
            let before = elements.len();
            flatten(value, &mut elements);
            let found = elements.len() - before;
            if found != per_record {
                return Err(mismatch(format!(
                    "record {} has {} values, expected {}",
                    index, found, per_record
                )));
            }
        }

        let mut shape = Vec::with_capacity(sizes.len());
        shape.push(self.batch.len());
        shape.extend(trailing);

        let data = convert(variable, field, &elements)?;
        Ok((shape, data))
    }
}

fn convert(variable: &str, field: &FieldSpec, elements: &[&Value]) -> Result<VariableData, RenderError> {
    VariableData::from_values(field.nc_type, elements).map_err(|source| {
        RenderError::ValueConversion {
            variable: variable.to_string(),
            source,
        }
    })
}

/// Row-major leaves of a nested JSON array; a scalar yields itself.
fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten(item, out)),
        other => out.push(other),
    }
}
