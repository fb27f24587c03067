//! Output file naming.
//!
//! File names follow a fixed underscore-joined convention:
//!
//! ```text
//! {class01}_{class02}_{class03}_{class04}_{base}[_{station}]_{data_code}_{manufacturer}_{level}_{YYYYMMDD_HHMMSS[_frac]}[_{format}][_QC].nc
//! ```
//!
//! The station segment disappears entirely when the station code is empty.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SchemaError;

/// Timestamp layout accepted for the start time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact timestamp layout used inside file names
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Joins the name segments
pub const SEPARATOR: &str = "_";

/// Suffix segment appended for quality-controlled data
pub const QC_SUFFIX: &str = "QC";

/// File extension of the naming convention, used for every container format
pub const FILE_EXTENSION: &str = "nc";

/// A start time that matches neither accepted layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized timestamp '{0}', expected YYYY-MM-DD HH:MM:SS[.fraction]")]
pub struct TimestampFormatError(pub String);

/// Structured metadata for output file names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingMetadata {
    /// First-level classification code
    pub class01: String,
    /// Second-level classification code
    pub class02: String,
    /// Third-level classification code
    pub class03: String,
    /// Fourth-level classification code
    pub class04: String,
    /// Base code
    pub base: String,
    /// Station code; empty drops the segment
    pub station_code: String,
    /// Device data code
    pub data_code: String,
    /// Manufacturer code
    pub manufacturer: String,
    /// Data level
    pub data_level: String,
    /// Reserved slot of the naming tuple; the actual start time is supplied per call
    pub start_time: String,
    /// Format code suffix
    pub format_code: Option<String>,
    /// Append the quality-control suffix
    pub quality_control: bool,
}

impl NamingMetadata {
    /// Parse the positional naming tuple.
    ///
    /// Eleven string slots followed by an optional quality-control boolean.
    /// An empty format code means no format suffix.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let items = value
            .as_array()
            .ok_or_else(|| SchemaError::InvalidNaming(format!("expected a list, found {}", value)))?;

        if items.len() != 11 && items.len() != 12 {
            return Err(SchemaError::InvalidNaming(format!(
                "expected 11 or 12 entries, found {}",
                items.len()
            )));
        }

        let text = |index: usize| -> Result<String, SchemaError> {
            match &items[index] {
                Value::String(s) => Ok(s.clone()),
                Value::Null => Ok(String::new()),
                other => Err(SchemaError::InvalidNaming(format!(
                    "entry {} must be a string, found {}",
                    index, other
                ))),
            }
        };

        let quality_control = match items.get(11) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(SchemaError::InvalidNaming(format!(
                    "quality control flag must be a boolean, found {}",
                    other
                )))
            }
        };

        let format_code = text(10)?;

        Ok(Self {
            class01: text(0)?,
            class02: text(1)?,
            class03: text(2)?,
            class04: text(3)?,
            base: text(4)?,
            station_code: text(5)?,
            data_code: text(6)?,
            manufacturer: text(7)?,
            data_level: text(8)?,
            start_time: text(9)?,
            format_code: if format_code.is_empty() {
                None
            } else {
                Some(format_code)
            },
            quality_control,
        })
    }

    /// Build the output file name for a batch starting at `start_time`.
    ///
    /// Pure: identical inputs always produce identical names.
    pub fn file_name(&self, start_time: &str) -> Result<String, TimestampFormatError> {
        let token = timestamp_token(start_time)?;

        let mut segments: Vec<&str> = vec![
            self.class01.as_str(),
            self.class02.as_str(),
            self.class03.as_str(),
            self.class04.as_str(),
            self.base.as_str(),
        ];
        if !self.station_code.is_empty() {
            segments.push(&self.station_code);
        }
        segments.extend([
            self.data_code.as_str(),
            self.manufacturer.as_str(),
            self.data_level.as_str(),
            token.as_str(),
        ]);
        if let Some(format_code) = &self.format_code {
            segments.push(format_code);
        }
        if self.quality_control {
            segments.push(QC_SUFFIX);
        }

        Ok(format!("{}.{}", segments.join(SEPARATOR), FILE_EXTENSION))
    }
}

/// Convert `YYYY-MM-DD HH:MM:SS[.frac]` into `YYYYMMDD_HHMMSS[_frac]`.
pub fn timestamp_token(timestamp: &str) -> Result<String, TimestampFormatError> {
    let invalid = || TimestampFormatError(timestamp.to_string());

    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) {
        return Ok(dt.format(FILENAME_TIMESTAMP_FORMAT).to_string());
    }

    let (whole, fraction) = timestamp.split_once('.').ok_or_else(invalid)?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let dt = NaiveDateTime::parse_from_str(whole, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
    Ok(format!(
        "{}{}{}",
        dt.format(FILENAME_TIMESTAMP_FORMAT),
        SEPARATOR,
        fraction
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn radar_naming() -> NamingMetadata {
        NamingMetadata::from_json(&json!([
            "RADA", "MODI", "MOBS", "SUOB", "WNFB", "", "RRD", "METE", "Lraw", "", "FMT", true
        ]))
        .unwrap()
    }

    #[test]
    fn test_timestamp_token() {
        assert_eq!(timestamp_token("2024-03-01 10:00:00").unwrap(), "20240301_100000");
        assert_eq!(
            timestamp_token("2023-11-23 21:07:11.250").unwrap(),
            "20231123_210711_250"
        );
    }

    #[test]
    fn test_timestamp_token_rejects_other_layouts() {
        for bad in [
            "2024/03/01 10:00:00",
            "2024-03-01T10:00:00",
            "2024-03-01 10:00:00.",
            "2024-03-01 10:00:00.5a",
            "2024-13-01 10:00:00",
            "",
        ] {
            assert_eq!(
                timestamp_token(bad),
                Err(TimestampFormatError(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_name_without_station() {
        let naming = radar_naming();
        assert_eq!(
            naming.file_name("2024-03-01 10:00:00").unwrap(),
            "RADA_MODI_MOBS_SUOB_WNFB_RRD_METE_Lraw_20240301_100000_FMT_QC.nc"
        );
    }

    #[test]
    fn test_file_name_with_station_no_format_no_qc() {
        let naming = NamingMetadata {
            station_code: "56691".to_string(),
            format_code: None,
            quality_control: false,
            ..radar_naming()
        };
        assert_eq!(
            naming.file_name("2024-03-01 10:00:00.5").unwrap(),
            "RADA_MODI_MOBS_SUOB_WNFB_56691_RRD_METE_Lraw_20240301_100000_5.nc"
        );
    }

    #[test]
    fn test_file_name_is_deterministic() {
        let naming = radar_naming();
        let a = naming.file_name("2024-03-01 10:00:00").unwrap();
        let b = naming.file_name("2024-03-01 10:00:00").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_naming_tuple_defaults_quality_control() {
        let naming = NamingMetadata::from_json(&json!([
            "A", "B", "C", "D", "E", "", "F", "G", "L1", "", ""
        ]))
        .unwrap();
        assert!(!naming.quality_control);
        assert_eq!(naming.format_code, None);
        assert_eq!(
            naming.file_name("2024-01-02 03:04:05").unwrap(),
            "A_B_C_D_E_F_G_L1_20240102_030405.nc"
        );
    }

    #[test]
    fn test_naming_tuple_arity() {
        let err = NamingMetadata::from_json(&json!(["A", "B"])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNaming(_)));

        let err = NamingMetadata::from_json(&json!([
            "A", "B", "C", "D", "E", "", "F", "G", "L1", "", "", "yes"
        ]))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNaming(_)));
    }
}
