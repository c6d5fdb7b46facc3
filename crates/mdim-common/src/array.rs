//! The array abstraction shared by real and derived arrays.

use std::fmt;
use std::sync::Arc;

use crate::buffer::{alloc_bytes, decode_all, DestBuffer};
use crate::datatype::DataType;
use crate::dimension::Dimension;
use crate::error::MdimResult;
use crate::window::Window;

/// A named, typed, multidimensional array with windowed reads.
///
/// Implementations are read-only from this trait's point of view and must be
/// safe to share across threads.
pub trait MdArray: Send + Sync + fmt::Debug {
    /// Short name of the array.
    fn name(&self) -> &str;

    /// Full path of the array (e.g. `/group/temperature`).
    fn full_name(&self) -> &str;

    /// Ordered dimensions. Their count is the rank.
    fn dimensions(&self) -> &[Arc<Dimension>];

    /// Element data type.
    fn data_type(&self) -> DataType;

    /// NoData value, if any.
    fn raw_no_data(&self) -> Option<f64> {
        None
    }

    /// Unit of the values.
    fn unit(&self) -> Option<&str> {
        None
    }

    /// Spatial reference definition.
    fn spatial_ref(&self) -> Option<&str> {
        None
    }

    /// Preferred read block size per axis (0 = no preference).
    fn block_size(&self) -> Vec<u64> {
        vec![0; self.dimensions().len()]
    }

    /// Read a window into `dest`, converting to the destination type.
    ///
    /// `dest` must have the same rank as `window`.
    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()>;

    fn rank(&self) -> usize {
        self.dimensions().len()
    }

    fn shape(&self) -> Vec<u64> {
        self.dimensions().iter().map(|d| d.size()).collect()
    }

    fn total_elements(&self) -> u64 {
        self.dimensions().iter().map(|d| d.size()).product()
    }

    /// Read a window into a freshly allocated packed `f64` vector.
    fn read_f64(&self, window: &Window) -> MdimResult<Vec<f64>> {
        window.validate(&self.shape())?;
        let mut bytes = alloc_bytes(window.element_count() * DataType::Float64.size_bytes())?;
        {
            let mut dest = DestBuffer::packed(&mut bytes, DataType::Float64, &window.count)?;
            self.read(window, &mut dest)?;
        }
        Ok(decode_all(DataType::Float64, &bytes))
    }

    /// Read the whole array as `f64` values in row-major order.
    fn read_all_f64(&self) -> MdimResult<Vec<f64>> {
        self.read_f64(&Window::full(&self.shape()))
    }
}
