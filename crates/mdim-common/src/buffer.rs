//! Destination buffers for windowed reads.

use crate::datatype::DataType;
use crate::error::{MdimError, MdimResult};
use crate::window::packed_strides;

/// Typed view over caller memory that a read writes into.
///
/// Element positions are computed as `base + sum(index[axis] * strides[axis])`,
/// in elements of `data_type`. Strides may be negative as long as every
/// position touched stays inside the slice.
#[derive(Debug)]
pub struct DestBuffer<'a> {
    data: &'a mut [u8],
    data_type: DataType,
    strides: Vec<isize>,
    base: isize,
}

impl<'a> DestBuffer<'a> {
    /// Wrap caller memory with explicit element strides.
    pub fn new(data: &'a mut [u8], data_type: DataType, strides: Vec<isize>) -> MdimResult<Self> {
        if !data_type.is_numeric() {
            return Err(MdimError::not_supported(format!(
                "destination data type {} is not numeric",
                data_type
            )));
        }
        Ok(Self {
            data,
            data_type,
            strides,
            base: 0,
        })
    }

    /// Wrap caller memory as a packed row-major buffer for `count`.
    pub fn packed(data: &'a mut [u8], data_type: DataType, count: &[usize]) -> MdimResult<Self> {
        Self::new(data, data_type, packed_strides(count))
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.strides.len()
    }

    /// Element offset of an index tuple.
    #[inline]
    pub fn offset_of(&self, idx: &[usize]) -> isize {
        idx.iter()
            .zip(&self.strides)
            .fold(self.base, |acc, (&i, &s)| acc + i as isize * s)
    }

    /// Write one value at an element offset relative to this view's base.
    pub fn write(&mut self, element_offset: isize, value: f64) -> MdimResult<()> {
        let size = self.data_type.size_bytes() as isize;
        let byte = element_offset * size;
        if byte < 0 || byte + size > self.data.len() as isize {
            return Err(MdimError::invalid(format!(
                "destination element {} is outside the {}-byte buffer",
                element_offset,
                self.data.len()
            )));
        }
        self.data_type.encode(value, &mut self.data[byte as usize..]);
        Ok(())
    }

    /// Write one value at an index tuple.
    #[inline]
    pub fn write_at(&mut self, idx: &[usize], value: f64) -> MdimResult<()> {
        let offset = self.offset_of(idx);
        self.write(offset, value)
    }

    /// Fill every position of a `count` box with the same value.
    pub fn fill(&mut self, count: &[usize], value: f64) -> MdimResult<()> {
        crate::window::for_each_index(count, |idx| self.write_at(idx, value))
    }

    /// Borrow a sub-view shifted by `offset` elements with its own strides.
    ///
    /// Used to delegate part of a read to another array.
    pub fn sub_view(&mut self, offset: isize, strides: Vec<isize>) -> DestBuffer<'_> {
        DestBuffer {
            data: &mut *self.data,
            data_type: self.data_type,
            strides,
            base: self.base + offset,
        }
    }
}

/// Allocate a zeroed byte buffer, reporting allocation failure as an error.
pub fn alloc_bytes(len: usize) -> MdimResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Allocate a value buffer filled with `fill`, reporting allocation failure.
pub fn alloc_values(len: usize, fill: f64) -> MdimResult<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, fill);
    Ok(buf)
}

/// Decode a packed byte buffer into values.
pub fn decode_all(data_type: DataType, bytes: &[u8]) -> Vec<f64> {
    let size = data_type.size_bytes().max(1);
    bytes.chunks_exact(size).map(|c| data_type.decode(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_numeric_destination_rejected() {
        let mut bytes = vec![0u8; 8];
        let err = DestBuffer::new(&mut bytes, DataType::String, vec![1]).unwrap_err();
        assert!(matches!(err, MdimError::NotSupported(_)));
    }

    #[test]
    fn test_write_with_strides_and_sub_view() {
        let mut bytes = vec![0u8; 6 * 4];
        let mut dest = DestBuffer::packed(&mut bytes, DataType::Int32, &[2, 3]).unwrap();
        dest.write_at(&[1, 2], 7.0).unwrap();
        {
            let mut row = dest.sub_view(3, vec![1]);
            row.write_at(&[0], 5.0).unwrap();
        }
        assert!(dest.write(6, 1.0).is_err());
        let values = decode_all(DataType::Int32, &bytes);
        assert_eq!(values, vec![0.0, 0.0, 0.0, 5.0, 0.0, 7.0]);
    }

    #[test]
    fn test_fill() {
        let mut bytes = vec![0u8; 4 * 8];
        let mut dest = DestBuffer::packed(&mut bytes, DataType::Float64, &[2, 2]).unwrap();
        dest.fill(&[2, 2], -1.0).unwrap();
        assert_eq!(decode_all(DataType::Float64, &bytes), vec![-1.0; 4]);
    }
}
