//! Input records.
//!
//! A record is a flat JSON object mapping source keys to values. Observation
//! values may be nested arrays when the variable has trailing dimensions.
//! Batches are loaded from either a JSON array of objects or JSON Lines.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

/// One input record
pub type Record = Map<String, Value>;

/// Errors that can occur while loading records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// I/O error reading the records file
    #[error("Failed to read records: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON parsing error at record {index}: {source}")]
    JsonError {
        /// Zero-based record (or line) index
        index: usize,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// An entry is not a JSON object
    #[error("Record {0} is not a JSON object")]
    NotAnObject(usize),
}

/// Load records from a file.
///
/// Files ending in `.jsonl` or `.ndjson` are read as JSON Lines; anything
/// else is parsed as JSON, falling back to JSON Lines when the content is not
/// a single JSON document.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, RecordError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let is_lines = path
        .extension()
        .map(|ext| ext == "jsonl" || ext == "ndjson")
        .unwrap_or(false);

    if is_lines {
        parse_json_lines(&content)
    } else {
        parse_records(&content)
    }
}

/// Parse a JSON array of objects (or a single object), or JSON Lines.
pub fn parse_records(content: &str) -> Result<Vec<Record>, RecordError> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| into_record(item, index))
            .collect(),
        Ok(other) => into_record(other, 0).map(|record| vec![record]),
        Err(_) => parse_json_lines(content),
    }
}

/// Parse one JSON object per non-blank line.
pub fn parse_json_lines(content: &str) -> Result<Vec<Record>, RecordError> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|source| RecordError::JsonError { index, source })?;
            into_record(value, index)
        })
        .collect()
}

fn into_record(value: Value, index: usize) -> Result<Record, RecordError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RecordError::NotAnObject(index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_json_array() {
        let records = parse_records(r#"[{"a": 1}, {"a": 2, "b": "x"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["b"], "x");
    }

    #[test]
    fn test_parse_single_object() {
        let records = parse_records(r#"{"Datetime": "2024-03-01 10:00:00"}"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_json_lines_fallback() {
        let records = parse_records("{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], 2);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = parse_records("[{\"a\": 1}, 3]").unwrap_err();
        assert!(matches!(err, RecordError::NotAnObject(1)));
    }

    #[test]
    fn test_bad_line_reports_index() {
        let err = parse_json_lines("{\"a\": 1}\n{oops}\n").unwrap_err();
        assert!(matches!(err, RecordError::JsonError { index: 1, .. }));
    }

    #[test]
    fn test_load_jsonl_file() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{{\"T\": 280.5}}").unwrap();
        writeln!(file, "{{\"T\": 281.0}}").unwrap();
        file.flush().unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["T"], 280.5);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[{{\"T\": 1}}]").unwrap();
        file.flush().unwrap();

        assert_eq!(load_records(file.path()).unwrap().len(), 1);
    }
}
