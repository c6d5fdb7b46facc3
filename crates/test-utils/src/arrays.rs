//! Synthetic arrays for exercising derived views.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mdim_common::{
    for_each_index, DataType, DestBuffer, Dimension, MdArray, MdimError, MdimResult, Window,
};

/// Wraps an array and records every window read from it.
#[derive(Debug)]
pub struct CountingArray {
    inner: Arc<dyn MdArray>,
    reads: AtomicUsize,
    windows: Mutex<Vec<Window>>,
}

impl CountingArray {
    pub fn new(inner: Arc<dyn MdArray>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
        })
    }

    /// Number of `read` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Windows requested so far, in call order.
    pub fn windows(&self) -> Vec<Window> {
        self.windows.lock().clone()
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.windows.lock().clear();
    }
}

impl MdArray for CountingArray {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn full_name(&self) -> &str {
        self.inner.full_name()
    }

    fn dimensions(&self) -> &[Arc<Dimension>] {
        self.inner.dimensions()
    }

    fn data_type(&self) -> DataType {
        self.inner.data_type()
    }

    fn raw_no_data(&self) -> Option<f64> {
        self.inner.raw_no_data()
    }

    fn unit(&self) -> Option<&str> {
        self.inner.unit()
    }

    fn spatial_ref(&self) -> Option<&str> {
        self.inner.spatial_ref()
    }

    fn block_size(&self) -> Vec<u64> {
        self.inner.block_size()
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.windows.lock().push(window.clone());
        self.inner.read(window, dest)
    }
}

type ValueFn = dyn Fn(&[u64]) -> f64 + Send + Sync;

/// An array whose values are computed from their indices on read.
///
/// Lets tests declare arrays far too large to hold in memory.
pub struct FunctionArray {
    name: String,
    full_name: String,
    dims: Vec<Arc<Dimension>>,
    data_type: DataType,
    value: Box<ValueFn>,
}

impl FunctionArray {
    pub fn new<F>(
        full_name: impl Into<String>,
        dims: Vec<Arc<Dimension>>,
        data_type: DataType,
        value: F,
    ) -> Self
    where
        F: Fn(&[u64]) -> f64 + Send + Sync + 'static,
    {
        let full_name = full_name.into();
        let name = full_name.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            name,
            full_name,
            dims,
            data_type,
            value: Box::new(value),
        }
    }

    /// Every element equal to `value`.
    pub fn constant(
        full_name: impl Into<String>,
        dims: Vec<Arc<Dimension>>,
        data_type: DataType,
        value: f64,
    ) -> Self {
        Self::new(full_name, dims, data_type, move |_| value)
    }
}

impl fmt::Debug for FunctionArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionArray")
            .field("full_name", &self.full_name)
            .field("shape", &self.shape())
            .finish()
    }
}

impl MdArray for FunctionArray {
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

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        window.validate(&self.shape())?;
        let mut source = vec![0u64; window.rank()];
        for_each_index(&window.count, |idx| {
            for (axis, &i) in idx.iter().enumerate() {
                source[axis] = window.index(axis, i);
            }
            dest.write_at(idx, self.data_type.coerce((self.value)(&source)))
        })
    }
}

/// An array whose reads always fail.
#[derive(Debug)]
pub struct FailingArray {
    name: String,
    full_name: String,
    dims: Vec<Arc<Dimension>>,
    data_type: DataType,
}

impl FailingArray {
    pub fn new(full_name: impl Into<String>, dims: Vec<Arc<Dimension>>, data_type: DataType) -> Self {
        let full_name = full_name.into();
        let name = full_name.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            name,
            full_name,
            dims,
            data_type,
        }
    }
}

impl MdArray for FailingArray {
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

    fn read(&self, _window: &Window, _dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        Err(MdimError::read_failed(format!(
            "{} is not readable",
            self.full_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdim_common::{DimensionKind, MemArray};

    #[test]
    fn test_function_array_strided_read() {
        let y = Arc::new(Dimension::new("/y", DimensionKind::HorizontalY, 3));
        let x = Arc::new(Dimension::new("/x", DimensionKind::HorizontalX, 4));
        let array = FunctionArray::new("/f", vec![y, x], DataType::Int32, |idx| {
            (idx[0] * 10 + idx[1]) as f64
        });
        let values = array
            .read_f64(&Window::new(vec![2, 3], vec![2, 2], vec![-1, -2]))
            .unwrap();
        assert_eq!(values, vec![23.0, 21.0, 13.0, 11.0]);
        assert_eq!(array.name(), "f");
    }

    #[test]
    fn test_counting_array_records_windows() {
        let d = Arc::new(Dimension::new("/d", DimensionKind::Other, 3));
        let inner: Arc<dyn MdArray> = Arc::new(
            MemArray::from_values("/v", vec![d], DataType::Float64, &[1.0, 2.0, 3.0]).unwrap(),
        );
        let counting = CountingArray::new(inner);
        let window = Window::contiguous(vec![1], vec![2]);
        assert_eq!(counting.read_f64(&window).unwrap(), vec![2.0, 3.0]);
        assert_eq!(counting.read_count(), 1);
        assert_eq!(counting.windows(), vec![window]);

        counting.reset();
        assert_eq!(counting.read_count(), 0);
    }

    #[test]
    fn test_failing_array() {
        let d = Arc::new(Dimension::new("/d", DimensionKind::Other, 2));
        let array = FailingArray::new("/broken", vec![d], DataType::Float32);
        let err = array.read_all_f64().unwrap_err();
        assert!(matches!(err, MdimError::Read(_)));
    }
}
