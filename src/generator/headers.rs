//! Per-render header values.

use chrono::Local;
use serde_json::{Map, Value};

use super::error::RenderError;
use crate::records::Record;
use crate::schema::naming::TIMESTAMP_FORMAT;
use crate::schema::{field_key, CompiledSchema};

/// Header field filled with the batch start time
pub const OBSERVATION_START_FIELD: &str = "Obse_begi_DT";

/// Header field filled with the batch end time
pub const OBSERVATION_END_FIELD: &str = "Obse_end_DT";

/// Header field filled with the render time
pub const CREATION_TIME_FIELD: &str = "Data_crea_DT";

/// Header values of one render, keyed by field path in depth-first order
pub type HeaderValues = Map<String, Value>;

/// Time values substituted into the placeholder header fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Observation start; leaves the default in place when `None` or empty
    pub start_time: Option<String>,
    /// Observation end; leaves the default in place when `None` or empty
    pub end_time: Option<String>,
    /// Creation time; the current local time when `None`
    pub created_at: Option<String>,
}

impl RenderOptions {
    /// Start and end from the first and last record's `time_key`.
    pub fn from_batch(batch: &[Record], time_key: &str) -> Self {
        Self {
            start_time: batch.first().and_then(|r| time_value(r, time_key)),
            end_time: batch.last().and_then(|r| time_value(r, time_key)),
            created_at: None,
        }
    }

    /// Pin the creation time
    pub fn created_at(mut self, timestamp: impl Into<String>) -> Self {
        self.created_at = Some(timestamp.into());
        self
    }

    /// Override the start time
    pub fn start_time(mut self, timestamp: impl Into<String>) -> Self {
        self.start_time = Some(timestamp.into());
        self
    }

    /// Override the end time
    pub fn end_time(mut self, timestamp: impl Into<String>) -> Self {
        self.end_time = Some(timestamp.into());
        self
    }
}

/// Null and empty times count as absent.
fn time_value(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Resolve every header field for one batch.
///
/// Fields with a source key read it from the first record. Fields without
/// one take the matching placeholder time, if any, and otherwise keep their
/// compiled default. The schema is never modified.
pub fn fill_headers(
    schema: &CompiledSchema,
    batch: &[Record],
    options: &RenderOptions,
) -> Result<HeaderValues, RenderError> {
    let first = batch.first().ok_or(RenderError::EmptyBatch)?;
    let created_at = options
        .created_at
        .clone()
        .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());

    let mut values = HeaderValues::new();
    for (group, field) in schema.header().fields() {
        let path = field_key(&group, &field.output_name);
        let value = match &field.source_key {
            Some(key) => first
                .get(key)
                .cloned()
                .ok_or_else(|| RenderError::MissingField {
                    field: path.clone(),
                    key: key.clone(),
                    record: 0,
                })?,
            None => match (field.output_name.as_str(), options) {
                (OBSERVATION_START_FIELD, RenderOptions { start_time: Some(start), .. })
                    if !start.is_empty() =>
                {
                    Value::String(start.clone())
                }
                (OBSERVATION_END_FIELD, RenderOptions { end_time: Some(end), .. })
                    if !end.is_empty() =>
                {
                    Value::String(end.clone())
                }
                (CREATION_TIME_FIELD, _) => Value::String(created_at.clone()),
                _ => field.default.clone().unwrap_or(Value::Null),
            },
        };
        values.insert(path, value);
    }
    Ok(values)
}
