//! # Type Catalog
//!
//! Fixed mapping from the semantic scalar-type names used in declarative schemas
//! (`byte`, `short`, `float`, `string`, ...) to the on-disk type tags of the
//! container codec (`i1`, `i2`, `f4`, `str`, ...).
//!
//! | Name | Tag | Width | Fill value |
//! |------|-----|-------|------------|
//! | byte | i1 | 1 | -127 |
//! | ubyte | u1 | 1 | 255 |
//! | short | i2 | 2 | -32767 |
//! | ushort | u2 | 2 | 65535 |
//! | int | i4 | 4 | -2147483647 |
//! | uint | u4 | 4 | 4294967295 |
//! | int64 | i8 | 8 | -9223372036854775806 |
//! | uint64 | u8 | 8 | 18446744073709551614 |
//! | float | f4 | 4 | 9.96921e36 |
//! | double | f8 | 8 | 9.969209968386869e36 |
//! | string | str | - | "" |
//!
//! Fill values are the NetCDF defaults and stand in for JSON `null`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar type of a container variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NcType {
    /// Signed 8-bit integer
    Byte,
    /// Unsigned 8-bit integer
    UByte,
    /// Signed 16-bit integer
    Short,
    /// Unsigned 16-bit integer
    UShort,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UInt,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 64-bit integer
    UInt64,
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
    /// Variable-length UTF-8 string
    String,
}

/// Default fill value for `byte` variables
pub const FILL_BYTE: i8 = -127;
/// Default fill value for `ubyte` variables
pub const FILL_UBYTE: u8 = 255;
/// Default fill value for `short` variables
pub const FILL_SHORT: i16 = -32767;
/// Default fill value for `ushort` variables
pub const FILL_USHORT: u16 = 65535;
/// Default fill value for `int` variables
pub const FILL_INT: i32 = -2_147_483_647;
/// Default fill value for `uint` variables
pub const FILL_UINT: u32 = 4_294_967_295;
/// Default fill value for `int64` variables
pub const FILL_INT64: i64 = -9_223_372_036_854_775_806;
/// Default fill value for `uint64` variables
pub const FILL_UINT64: u64 = 18_446_744_073_709_551_614;
/// Default fill value for `float` variables
pub const FILL_FLOAT: f32 = 9.969_209_968_386_869e36;
/// Default fill value for `double` variables
pub const FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

impl NcType {
    /// Every catalog entry, in tag order
    pub const ALL: [NcType; 11] = [
        NcType::Byte,
        NcType::UByte,
        NcType::Short,
        NcType::UShort,
        NcType::Int,
        NcType::UInt,
        NcType::Int64,
        NcType::UInt64,
        NcType::Float,
        NcType::Double,
        NcType::String,
    ];

    /// On-disk type tag
    pub fn tag(&self) -> &'static str {
        match self {
            NcType::Byte => "i1",
            NcType::UByte => "u1",
            NcType::Short => "i2",
            NcType::UShort => "u2",
            NcType::Int => "i4",
            NcType::UInt => "u4",
            NcType::Int64 => "i8",
            NcType::UInt64 => "u8",
            NcType::Float => "f4",
            NcType::Double => "f8",
            NcType::String => "str",
        }
    }

    /// Semantic name as written in declarative schemas
    pub fn name(&self) -> &'static str {
        match self {
            NcType::Byte => "byte",
            NcType::UByte => "ubyte",
            NcType::Short => "short",
            NcType::UShort => "ushort",
            NcType::Int => "int",
            NcType::UInt => "uint",
            NcType::Int64 => "int64",
            NcType::UInt64 => "uint64",
            NcType::Float => "float",
            NcType::Double => "double",
            NcType::String => "string",
        }
    }

    /// Size of one element in bytes, `None` for strings
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            NcType::Byte | NcType::UByte => Some(1),
            NcType::Short | NcType::UShort => Some(2),
            NcType::Int | NcType::UInt | NcType::Float => Some(4),
            NcType::Int64 | NcType::UInt64 | NcType::Double => Some(8),
            NcType::String => None,
        }
    }

    /// Returns true for the variable-length string type.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, NcType::String)
    }

    /// Look up a catalog entry by semantic name or tag (case-insensitive).
    pub fn lookup(name: &str) -> Option<Self> {
        let needle = name.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == needle || t.tag() == needle)
    }

    /// Fill value of this type as a JSON value
    pub fn fill_value(&self) -> Value {
        match self {
            NcType::Byte => Value::from(FILL_BYTE),
            NcType::UByte => Value::from(FILL_UBYTE),
            NcType::Short => Value::from(FILL_SHORT),
            NcType::UShort => Value::from(FILL_USHORT),
            NcType::Int => Value::from(FILL_INT),
            NcType::UInt => Value::from(FILL_UINT),
            NcType::Int64 => Value::from(FILL_INT64),
            NcType::UInt64 => Value::from(FILL_UINT64),
            NcType::Float => Value::from(FILL_FLOAT as f64),
            NcType::Double => Value::from(FILL_DOUBLE),
            NcType::String => Value::String(String::new()),
        }
    }
}

impl fmt::Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NcType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| UnknownTypeError(s.to_string()))
    }
}

/// A type name that is not in the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown variable type: '{0}'")]
pub struct UnknownTypeError(pub String);

/// Errors converting a record value into a typed element
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Numeric value does not fit the target type
    #[error("value {value} is out of range for {nc_type}")]
    OutOfRange {
        /// Offending value, rendered as JSON
        value: String,
        /// Target type
        nc_type: NcType,
    },

    /// Value cannot be interpreted as a number
    #[error("value {value} is not a valid {nc_type}")]
    NotNumeric {
        /// Offending value, rendered as JSON
        value: String,
        /// Target type
        nc_type: NcType,
    },

    /// Arrays and objects are not scalar elements
    #[error("value {value} is not a scalar")]
    NotScalar {
        /// Offending value, rendered as JSON
        value: String,
    },
}

/// Coerce a scalar into a signed integer within `[min, max]`.
///
/// `null` maps to `fill`. Floats are accepted only when integral.
pub(crate) fn coerce_signed(
    value: &Value,
    nc_type: NcType,
    min: i64,
    max: i64,
    fill: i64,
) -> Result<i64, ValueError> {
    let out_of_range = || ValueError::OutOfRange {
        value: value.to_string(),
        nc_type,
    };
    let parsed = match value {
        Value::Null => return Ok(fill),
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i,
            (None, Some(_), _) => return Err(out_of_range()),
            (None, None, Some(f)) => integral_from_f64(f, value, nc_type)?,
            _ => return Err(not_numeric(value, nc_type)),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => {
                    let f = s.parse::<f64>().map_err(|_| not_numeric(value, nc_type))?;
                    integral_from_f64(f, value, nc_type)?
                }
            }
        }
        Value::Array(_) | Value::Object(_) => return Err(not_scalar(value)),
    };
    if parsed < min || parsed > max {
        return Err(out_of_range());
    }
    Ok(parsed)
}

/// Coerce a scalar into an unsigned integer within `[0, max]`.
pub(crate) fn coerce_unsigned(
    value: &Value,
    nc_type: NcType,
    max: u64,
    fill: u64,
) -> Result<u64, ValueError> {
    let out_of_range = || ValueError::OutOfRange {
        value: value.to_string(),
        nc_type,
    };
    let parsed = match value {
        Value::Null => return Ok(fill),
        Value::Bool(b) => u64::from(*b),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => u,
            (None, Some(_), _) => return Err(out_of_range()),
            (None, None, Some(f)) => {
                let i = integral_from_f64(f, value, nc_type)?;
                u64::try_from(i).map_err(|_| out_of_range())?
            }
            _ => return Err(not_numeric(value, nc_type)),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(u) => u,
                Err(_) => {
                    let f = s.parse::<f64>().map_err(|_| not_numeric(value, nc_type))?;
                    let i = integral_from_f64(f, value, nc_type)?;
                    u64::try_from(i).map_err(|_| out_of_range())?
                }
            }
        }
        Value::Array(_) | Value::Object(_) => return Err(not_scalar(value)),
    };
    if parsed > max {
        return Err(out_of_range());
    }
    Ok(parsed)
}

/// Coerce a scalar into a float. `null` maps to `fill`.
pub(crate) fn coerce_float(value: &Value, nc_type: NcType, fill: f64) -> Result<f64, ValueError> {
    match value {
        Value::Null => Ok(fill),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().ok_or_else(|| not_numeric(value, nc_type)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| not_numeric(value, nc_type)),
        Value::Array(_) | Value::Object(_) => Err(not_scalar(value)),
    }
}

/// Coerce a scalar into text. Numbers and booleans are stringified, `null` is empty.
pub(crate) fn coerce_string(value: &Value) -> Result<String, ValueError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Err(not_scalar(value)),
    }
}

fn integral_from_f64(f: f64, value: &Value, nc_type: NcType) -> Result<i64, ValueError> {
    if !f.is_finite() || f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(not_numeric(value, nc_type));
    }
    Ok(f as i64)
}

fn not_numeric(value: &Value, nc_type: NcType) -> ValueError {
    ValueError::NotNumeric {
        value: value.to_string(),
        nc_type,
    }
}

fn not_scalar(value: &Value) -> ValueError {
    ValueError::NotScalar {
        value: value.to_string(),
    }
}
