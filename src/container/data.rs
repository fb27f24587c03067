//! Typed, flattened variable payloads.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde_json::Value;

use crate::dtype::{
    coerce_float, coerce_signed, coerce_string, coerce_unsigned, NcType, ValueError, FILL_BYTE,
    FILL_DOUBLE, FILL_FLOAT, FILL_INT, FILL_INT64, FILL_SHORT, FILL_UBYTE, FILL_UINT,
    FILL_UINT64, FILL_USHORT,
};

/// Row-major values of one variable, typed by the catalog entry
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    /// `byte` values
    Byte(Vec<i8>),
    /// `ubyte` values
    UByte(Vec<u8>),
    /// `short` values
    Short(Vec<i16>),
    /// `ushort` values
    UShort(Vec<u16>),
    /// `int` values
    Int(Vec<i32>),
    /// `uint` values
    UInt(Vec<u32>),
    /// `int64` values
    Int64(Vec<i64>),
    /// `uint64` values
    UInt64(Vec<u64>),
    /// `float` values
    Float(Vec<f32>),
    /// `double` values
    Double(Vec<f64>),
    /// `string` values
    String(Vec<String>),
}

impl VariableData {
    /// Convert scalar JSON values into a typed column.
    ///
    /// Fails on the first value that cannot be represented in `nc_type`.
    pub fn from_values(nc_type: NcType, values: &[&Value]) -> Result<Self, ValueError> {
        let data = match nc_type {
            NcType::Byte => VariableData::Byte(
                values
                    .iter()
                    .map(|v| {
                        coerce_signed(v, nc_type, i8::MIN.into(), i8::MAX.into(), FILL_BYTE.into())
                            .map(|x| x as i8)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::UByte => VariableData::UByte(
                values
                    .iter()
                    .map(|v| {
                        coerce_unsigned(v, nc_type, u8::MAX.into(), FILL_UBYTE.into()).map(|x| x as u8)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::Short => VariableData::Short(
                values
                    .iter()
                    .map(|v| {
                        coerce_signed(v, nc_type, i16::MIN.into(), i16::MAX.into(), FILL_SHORT.into())
                            .map(|x| x as i16)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::UShort => VariableData::UShort(
                values
                    .iter()
                    .map(|v| {
                        coerce_unsigned(v, nc_type, u16::MAX.into(), FILL_USHORT.into())
                            .map(|x| x as u16)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::Int => VariableData::Int(
                values
                    .iter()
                    .map(|v| {
                        coerce_signed(v, nc_type, i32::MIN.into(), i32::MAX.into(), FILL_INT.into())
                            .map(|x| x as i32)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::UInt => VariableData::UInt(
                values
                    .iter()
                    .map(|v| {
                        coerce_unsigned(v, nc_type, u32::MAX.into(), FILL_UINT.into())
                            .map(|x| x as u32)
                    })
                    .collect::<Result<_, _>>()?,
            ),
            NcType::Int64 => VariableData::Int64(
                values
                    .iter()
                    .map(|v| coerce_signed(v, nc_type, i64::MIN, i64::MAX, FILL_INT64))
                    .collect::<Result<_, _>>()?,
            ),
            NcType::UInt64 => VariableData::UInt64(
                values
                    .iter()
                    .map(|v| coerce_unsigned(v, nc_type, u64::MAX, FILL_UINT64))
                    .collect::<Result<_, _>>()?,
            ),
            NcType::Float => VariableData::Float(
                values
                    .iter()
                    .map(|v| coerce_float(v, nc_type, FILL_FLOAT.into()).map(|x| x as f32))
                    .collect::<Result<_, _>>()?,
            ),
            NcType::Double => VariableData::Double(
                values
                    .iter()
                    .map(|v| coerce_float(v, nc_type, FILL_DOUBLE))
                    .collect::<Result<_, _>>()?,
            ),
            NcType::String => VariableData::String(
                values
                    .iter()
                    .map(|v| coerce_string(v))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(data)
    }

    /// Catalog type of these values
    pub fn nc_type(&self) -> NcType {
        match self {
            VariableData::Byte(_) => NcType::Byte,
            VariableData::UByte(_) => NcType::UByte,
            VariableData::Short(_) => NcType::Short,
            VariableData::UShort(_) => NcType::UShort,
            VariableData::Int(_) => NcType::Int,
            VariableData::UInt(_) => NcType::UInt,
            VariableData::Int64(_) => NcType::Int64,
            VariableData::UInt64(_) => NcType::UInt64,
            VariableData::Float(_) => NcType::Float,
            VariableData::Double(_) => NcType::Double,
            VariableData::String(_) => NcType::String,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            VariableData::Byte(v) => v.len(),
            VariableData::UByte(v) => v.len(),
            VariableData::Short(v) => v.len(),
            VariableData::UShort(v) => v.len(),
            VariableData::Int(v) => v.len(),
            VariableData::UInt(v) => v.len(),
            VariableData::Int64(v) => v.len(),
            VariableData::UInt64(v) => v.len(),
            VariableData::Float(v) => v.len(),
            VariableData::Double(v) => v.len(),
            VariableData::String(v) => v.len(),
        }
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as a JSON value
    pub fn value(&self, index: usize) -> Option<Value> {
        match self {
            VariableData::Byte(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::UByte(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::Short(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::UShort(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::Int(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::UInt(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::Int64(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::UInt64(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::Float(v) => v.get(index).map(|x| Value::from(f64::from(*x))),
            VariableData::Double(v) => v.get(index).map(|x| Value::from(*x)),
            VariableData::String(v) => v.get(index).map(|x| Value::from(x.as_str())),
        }
    }

    /// Serialize as little-endian values; strings are `u32` length-prefixed UTF-8.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.len() * self.nc_type().byte_width().unwrap_or(8));
        match self {
            VariableData::Byte(v) => v.iter().try_for_each(|x| out.write_i8(*x))?,
            VariableData::UByte(v) => out.extend_from_slice(v),
            VariableData::Short(v) => v.iter().try_for_each(|x| out.write_i16::<LittleEndian>(*x))?,
            VariableData::UShort(v) => v.iter().try_for_each(|x| out.write_u16::<LittleEndian>(*x))?,
            VariableData::Int(v) => v.iter().try_for_each(|x| out.write_i32::<LittleEndian>(*x))?,
            VariableData::UInt(v) => v.iter().try_for_each(|x| out.write_u32::<LittleEndian>(*x))?,
            VariableData::Int64(v) => v.iter().try_for_each(|x| out.write_i64::<LittleEndian>(*x))?,
            VariableData::UInt64(v) => v.iter().try_for_each(|x| out.write_u64::<LittleEndian>(*x))?,
            VariableData::Float(v) => v.iter().try_for_each(|x| out.write_f32::<LittleEndian>(*x))?,
            VariableData::Double(v) => v.iter().try_for_each(|x| out.write_f64::<LittleEndian>(*x))?,
            VariableData::String(v) => {
                for s in v {
                    let len = u32::try_from(s.len()).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidInput, "string longer than 4 GiB")
                    })?;
                    out.write_u32::<LittleEndian>(len)?;
                    out.extend_from_slice(s.as_bytes());
                }
            }
        }
        Ok(out)
    }

    /// Inverse of [`VariableData::encode`] for `count` elements.
    pub fn decode(nc_type: NcType, bytes: &[u8], count: usize) -> io::Result<Self> {
        let mut rdr = Cursor::new(bytes);
        let data = match nc_type {
            NcType::Byte => VariableData::Byte(read_n(count, || rdr.read_i8())?),
            NcType::UByte => VariableData::UByte(read_n(count, || rdr.read_u8())?),
            NcType::Short => VariableData::Short(read_n(count, || rdr.read_i16::<LittleEndian>())?),
            NcType::UShort => {
                VariableData::UShort(read_n(count, || rdr.read_u16::<LittleEndian>())?)
            }
            NcType::Int => VariableData::Int(read_n(count, || rdr.read_i32::<LittleEndian>())?),
            NcType::UInt => VariableData::UInt(read_n(count, || rdr.read_u32::<LittleEndian>())?),
            NcType::Int64 => VariableData::Int64(read_n(count, || rdr.read_i64::<LittleEndian>())?),
            NcType::UInt64 => {
                VariableData::UInt64(read_n(count, || rdr.read_u64::<LittleEndian>())?)
            }
            NcType::Float => VariableData::Float(read_n(count, || rdr.read_f32::<LittleEndian>())?),
            NcType::Double => {
                VariableData::Double(read_n(count, || rdr.read_f64::<LittleEndian>())?)
            }
            NcType::String => VariableData::String(read_n(count, || {
                let len = rdr.read_u32::<LittleEndian>()? as usize;
                if len > bytes.len() - rdr.position() as usize {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "string length exceeds payload",
                    ));
                }
                let mut buf = vec![0u8; len];
                rdr.read_exact(&mut buf)?;
                String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })?),
        };

        if rdr.position() as usize != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} trailing bytes after {} {} values",
                    bytes.len() - rdr.position() as usize,
                    count,
                    nc_type
                ),
            ));
        }
        Ok(data)
    }
}

fn read_n<T>(count: usize, mut next: impl FnMut() -> io::Result<T>) -> io::Result<Vec<T>> {
    (0..count).map(|_| next()).collect()
}
