//! Regularly spaced coordinate arrays.

use std::sync::Arc;

use crate::array::MdArray;
use crate::buffer::DestBuffer;
use crate::datatype::DataType;
use crate::dimension::{Dimension, DimensionKind};
use crate::error::MdimResult;
use crate::window::Window;

/// 1-D read-only array whose value at `i` is `start + i * increment`.
#[derive(Debug)]
pub struct RegularlySpacedArray {
    name: String,
    full_name: String,
    dims: Vec<Arc<Dimension>>,
    start: f64,
    increment: f64,
}

impl RegularlySpacedArray {
    pub fn new(full_name: impl Into<String>, dim: Arc<Dimension>, start: f64, increment: f64) -> Self {
        let full_name = full_name.into();
        let name = full_name.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            name,
            full_name,
            dims: vec![dim],
            start,
            increment,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }
}

impl MdArray for RegularlySpacedArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn dimensions(&self) -> &[Arc<Dimension>] {
        &self.dims
    }

    fn data_type(&self) -> DataType {
        DataType::Float64
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        window.validate(&self.shape())?;
        for i in 0..window.count[0] {
            let value = self.start + window.index(0, i) as f64 * self.increment;
            dest.write_at(&[i], value)?;
        }
        Ok(())
    }
}

/// Build a dimension whose indexing variable is a regularly spaced array of
/// the same name.
pub fn regular_dimension(
    full_name: &str,
    kind: DimensionKind,
    size: u64,
    start: f64,
    increment: f64,
) -> Arc<Dimension> {
    let plain = Arc::new(Dimension::new(full_name, kind, size));
    let variable = Arc::new(RegularlySpacedArray::new(full_name, plain.clone(), start, increment));
    Arc::new((*plain).clone().with_indexing_variable(variable))
}
