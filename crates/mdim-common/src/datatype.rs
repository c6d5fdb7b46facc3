//! Element data types and value conversion.

use serde::{Deserialize, Serialize};

/// Numeric (and string) element types an array can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    String,
}

impl DataType {
    /// True for every type but `String`.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::String)
    }

    /// True for the integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::UInt8
                | Self::Int8
                | Self::UInt16
                | Self::Int16
                | Self::UInt32
                | Self::Int32
                | Self::UInt64
                | Self::Int64
        )
    }

    /// Size of one element in bytes. Zero for strings.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
            Self::String => 0,
        }
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int8 => "int8",
            Self::UInt16 => "uint16",
            Self::Int16 => "int16",
            Self::UInt32 => "uint32",
            Self::Int32 => "int32",
            Self::UInt64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }

    /// Bring a value into this type's domain.
    ///
    /// Integers round to nearest and saturate; NaN becomes 0.
    pub fn coerce(&self, value: f64) -> f64 {
        match self {
            Self::UInt8 => value.round() as u8 as f64,
            Self::Int8 => value.round() as i8 as f64,
            Self::UInt16 => value.round() as u16 as f64,
            Self::Int16 => value.round() as i16 as f64,
            Self::UInt32 => value.round() as u32 as f64,
            Self::Int32 => value.round() as i32 as f64,
            Self::UInt64 => value.round() as u64 as f64,
            Self::Int64 => value.round() as i64 as f64,
            Self::Float32 => value as f32 as f64,
            Self::Float64 | Self::String => value,
        }
    }

    /// Encode a value into `out`, which must hold at least `size_bytes()`.
    pub(crate) fn encode(&self, value: f64, out: &mut [u8]) {
        match self {
            Self::UInt8 => put(out, value.round() as u8),
            Self::Int8 => put(out, value.round() as i8),
            Self::UInt16 => put(out, value.round() as u16),
            Self::Int16 => put(out, value.round() as i16),
            Self::UInt32 => put(out, value.round() as u32),
            Self::Int32 => put(out, value.round() as i32),
            Self::UInt64 => put(out, value.round() as u64),
            Self::Int64 => put(out, value.round() as i64),
            Self::Float32 => put(out, value as f32),
            Self::Float64 => put(out, value),
            Self::String => {}
        }
    }

    /// Decode one element from the start of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            Self::UInt8 => bytes[0] as f64,
            Self::Int8 => bytes[0] as i8 as f64,
            Self::UInt16 => take::<u16>(bytes) as f64,
            Self::Int16 => take::<i16>(bytes) as f64,
            Self::UInt32 => take::<u32>(bytes) as f64,
            Self::Int32 => take::<i32>(bytes) as f64,
            Self::UInt64 => take::<u64>(bytes) as f64,
            Self::Int64 => take::<i64>(bytes) as f64,
            Self::Float32 => take::<f32>(bytes) as f64,
            Self::Float64 => take::<f64>(bytes),
            Self::String => f64::NAN,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[inline]
fn put<T: bytemuck::Pod>(out: &mut [u8], value: T) {
    let bytes = bytemuck::bytes_of(&value);
    out[..bytes.len()].copy_from_slice(bytes);
}

#[inline]
fn take<T: bytemuck::Pod>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<T>()])
}
