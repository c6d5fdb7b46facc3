//! In-memory arrays and groups.
//!
//! This is the reference driver: values are kept as `f64` already coerced to
//! the array's data type, and groups can be populated after they are shared.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::array::MdArray;
use crate::buffer::DestBuffer;
use crate::datatype::DataType;
use crate::dimension::{Dimension, DimensionKind};
use crate::error::{MdimError, MdimResult};
use crate::group::{join_path, Group};
use crate::window::{for_each_index, Window};

/// An array held entirely in memory.
pub struct MemArray {
    name: String,
    full_name: String,
    dims: Vec<Arc<Dimension>>,
    data_type: DataType,
    no_data: Option<f64>,
    unit: Option<String>,
    spatial_ref: Option<String>,
    block_size: Option<Vec<u64>>,
    values: RwLock<Vec<f64>>,
}

impl MemArray {
    /// Create a zero-filled array. String arrays hold no values.
    pub fn new(full_name: impl Into<String>, dims: Vec<Arc<Dimension>>, data_type: DataType) -> Self {
        let full_name = full_name.into();
        let name = full_name.rsplit('/').next().unwrap_or_default().to_string();
        let len = if data_type.is_numeric() {
            dims.iter().map(|d| d.size() as usize).product()
        } else {
            0
        };
        Self {
            name,
            full_name,
            dims,
            data_type,
            no_data: None,
            unit: None,
            spatial_ref: None,
            block_size: None,
            values: RwLock::new(vec![0.0; len]),
        }
    }

    /// Create an array and fill it in one step.
    pub fn from_values(
        full_name: impl Into<String>,
        dims: Vec<Arc<Dimension>>,
        data_type: DataType,
        values: &[f64],
    ) -> MdimResult<Self> {
        let array = Self::new(full_name, dims, data_type);
        array.write(values)?;
        Ok(array)
    }

    pub fn with_no_data(mut self, no_data: f64) -> Self {
        self.no_data = Some(no_data);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_spatial_ref(mut self, srs: impl Into<String>) -> Self {
        self.spatial_ref = Some(srs.into());
        self
    }

    pub fn with_block_size(mut self, block_size: Vec<u64>) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Replace every value, in row-major order.
    pub fn write(&self, values: &[f64]) -> MdimResult<()> {
        if !self.data_type.is_numeric() {
            return Err(MdimError::not_supported(format!(
                "Array {} is not of numeric type",
                self.full_name
            )));
        }
        let expected = self.total_elements() as usize;
        if values.len() != expected {
            return Err(MdimError::invalid(format!(
                "Array {} expects {} values, got {}",
                self.full_name,
                expected,
                values.len()
            )));
        }
        let mut stored = self.values.write();
        stored.clear();
        stored.extend(values.iter().map(|&v| self.data_type.coerce(v)));
        Ok(())
    }
}

impl fmt::Debug for MemArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemArray")
            .field("full_name", &self.full_name)
            .field("shape", &self.shape())
            .field("data_type", &self.data_type)
            .finish()
    }
}

impl MdArray for MemArray {
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
        self.data_type
    }

    fn raw_no_data(&self) -> Option<f64> {
        self.no_data
    }

    fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    fn spatial_ref(&self) -> Option<&str> {
        self.spatial_ref.as_deref()
    }

    fn block_size(&self) -> Vec<u64> {
        self.block_size
            .clone()
            .unwrap_or_else(|| vec![0; self.dims.len()])
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        if !self.data_type.is_numeric() {
            return Err(MdimError::not_supported(format!(
                "Array {} is not of numeric type",
                self.full_name
            )));
        }
        let shape = self.shape();
        window.validate(&shape)?;
        trace!(array = %self.full_name, count = ?window.count, "mem read");

        let mut src_strides = vec![1u64; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            src_strides[axis] = src_strides[axis + 1] * shape[axis + 1];
        }

        let values = self.values.read();
        for_each_index(&window.count, |idx| {
            let flat: u64 = idx
                .iter()
                .enumerate()
                .map(|(axis, &i)| window.index(axis, i) * src_strides[axis])
                .sum();
            dest.write_at(idx, values[flat as usize])
        })
    }
}

/// A group held entirely in memory.
pub struct MemGroup {
    name: String,
    full_name: String,
    dimensions: RwLock<Vec<Arc<Dimension>>>,
    arrays: RwLock<Vec<(String, Arc<dyn MdArray>)>>,
    groups: RwLock<Vec<(String, Arc<MemGroup>)>>,
}

impl MemGroup {
    /// Create an empty root group.
    pub fn new_root() -> Arc<Self> {
        Arc::new(Self::with_path("", "/"))
    }

    fn with_path(name: &str, full_name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: full_name.to_string(),
            dimensions: RwLock::new(Vec::new()),
            arrays: RwLock::new(Vec::new()),
            groups: RwLock::new(Vec::new()),
        }
    }

    /// Path a child named `name` would get.
    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.full_name, name)
    }

    pub fn create_group(&self, name: &str) -> MdimResult<Arc<MemGroup>> {
        let mut groups = self.groups.write();
        if groups.iter().any(|(n, _)| n == name) {
            return Err(MdimError::invalid(format!("Group {} already exists", name)));
        }
        let group = Arc::new(Self::with_path(name, &self.child_path(name)));
        groups.push((name.to_string(), group.clone()));
        Ok(group)
    }

    pub fn create_dimension(
        &self,
        name: &str,
        kind: DimensionKind,
        size: u64,
    ) -> MdimResult<Arc<Dimension>> {
        let dim = Arc::new(Dimension::new(self.child_path(name), kind, size));
        self.add_dimension(dim.clone())?;
        Ok(dim)
    }

    /// Register an already built dimension.
    pub fn add_dimension(&self, dim: Arc<Dimension>) -> MdimResult<()> {
        let mut dims = self.dimensions.write();
        if dims.iter().any(|d| d.name() == dim.name()) {
            return Err(MdimError::invalid(format!("Dimension {} already exists", dim.name())));
        }
        dims.push(dim);
        Ok(())
    }

    /// Attach an indexing variable to a declared dimension.
    ///
    /// Returns the new dimension. Arrays created earlier keep the dimension
    /// object they were built with.
    pub fn set_indexing_variable(
        &self,
        dim_name: &str,
        variable: Arc<dyn MdArray>,
    ) -> MdimResult<Arc<Dimension>> {
        let mut dims = self.dimensions.write();
        let slot = dims
            .iter_mut()
            .find(|d| d.name() == dim_name)
            .ok_or_else(|| MdimError::not_found(format!("Dimension {} does not exist", dim_name)))?;
        let updated = Arc::new((**slot).clone().with_indexing_variable(variable));
        *slot = updated.clone();
        Ok(updated)
    }

    /// Create and register a zero-filled array.
    pub fn create_array(
        &self,
        name: &str,
        dims: Vec<Arc<Dimension>>,
        data_type: DataType,
    ) -> MdimResult<Arc<MemArray>> {
        let array = Arc::new(MemArray::new(self.child_path(name), dims, data_type));
        self.add_array(array.clone())?;
        Ok(array)
    }

    /// Register an already built array under its own name.
    pub fn add_array(&self, array: Arc<dyn MdArray>) -> MdimResult<()> {
        let mut arrays = self.arrays.write();
        let name = array.name().to_string();
        if arrays.iter().any(|(n, _)| *n == name) {
            return Err(MdimError::invalid(format!("Array {} already exists", name)));
        }
        arrays.push((name, array));
        Ok(())
    }
}

impl fmt::Debug for MemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemGroup")
            .field("full_name", &self.full_name)
            .field("arrays", &self.array_names())
            .field("groups", &self.group_names())
            .finish()
    }
}

impl Group for MemGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn dimensions(&self) -> Vec<Arc<Dimension>> {
        self.dimensions.read().clone()
    }

    fn array_names(&self) -> Vec<String> {
        self.arrays.read().iter().map(|(n, _)| n.clone()).collect()
    }

    fn open_array(&self, name: &str) -> MdimResult<Arc<dyn MdArray>> {
        self.arrays
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| MdimError::not_found(format!("Array {} does not exist", name)))
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.read().iter().map(|(n, _)| n.clone()).collect()
    }

    fn open_group(&self, name: &str) -> MdimResult<Arc<dyn Group>> {
        self.groups
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g.clone() as Arc<dyn Group>)
            .ok_or_else(|| MdimError::not_found(format!("Group {} does not exist", name)))
    }
}
