//! Array view with one dimension restricted to a table of indices.

use std::sync::Arc;

use mdim_common::{for_each_index, DataType, DestBuffer, Dimension, MdArray, MdimResult, Window};

/// An array whose restricted axes are remapped through a match table.
///
/// Every axis carrying the restricted dimension is remapped; a dimension
/// may appear on several axes of the same array.
#[derive(Debug)]
pub struct SubsetArray {
    parent: Arc<dyn MdArray>,
    dims: Vec<Arc<Dimension>>,
    targeted: Vec<bool>,
    matches: Arc<[u64]>,
}

impl SubsetArray {
    /// Wrap `parent`, replacing each axis named `dim_full_name` with `replacement`.
    pub fn new(
        parent: Arc<dyn MdArray>,
        dim_full_name: &str,
        matches: Arc<[u64]>,
        replacement: Arc<Dimension>,
    ) -> Self {
        let targeted: Vec<bool> = parent
            .dimensions()
            .iter()
            .map(|d| d.full_name() == dim_full_name)
            .collect();
        let dims = parent
            .dimensions()
            .iter()
            .zip(&targeted)
            .map(|(d, &t)| if t { replacement.clone() } else { d.clone() })
            .collect();
        Self {
            parent,
            dims,
            targeted,
            matches,
        }
    }

    pub fn parent(&self) -> &Arc<dyn MdArray> {
        &self.parent
    }

    /// Parent index of element `i` of the window along `axis`.
    #[inline]
    fn source_index(&self, window: &Window, axis: usize, i: usize) -> u64 {
        let logical = window.index(axis, i);
        if self.targeted[axis] {
            self.matches[logical as usize]
        } else {
            logical
        }
    }

    /// Outermost axis restricted, every other axis passed through.
    fn read_outer(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        let stride = dest.strides()[0];
        let strides = dest.strides().to_vec();
        for i in 0..window.count[0] {
            let mut sub = window.clone();
            sub.start[0] = self.source_index(window, 0, i);
            sub.count[0] = 1;
            sub.step[0] = 1;
            let mut view = dest.sub_view(i as isize * stride, strides.clone());
            self.parent.read(&sub, &mut view)?;
        }
        Ok(())
    }

    /// Any layout: walk the outer axes, delegate the innermost run when it
    /// is not restricted, single cells otherwise.
    fn read_general(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        let rank = window.rank();
        let inner = rank - 1;
        let strides = dest.strides().to_vec();
        let inner_run = !self.targeted[inner];
        let outer_count: Vec<usize> = if inner_run {
            window.count[..inner].to_vec()
        } else {
            window.count.clone()
        };

        for_each_index(&outer_count, |idx| {
            let mut sub = Window::contiguous(vec![0; rank], vec![1; rank]);
            let mut offset = 0isize;
            for (axis, &i) in idx.iter().enumerate() {
                sub.start[axis] = self.source_index(window, axis, i);
                offset += i as isize * strides[axis];
            }
            if inner_run {
                sub.start[inner] = window.start[inner];
                sub.count[inner] = window.count[inner];
                sub.step[inner] = window.step[inner];
            }
            let mut view = dest.sub_view(offset, strides.clone());
            self.parent.read(&sub, &mut view)
        })
    }
}

impl MdArray for SubsetArray {
    fn name(&self) -> &str {
        self.parent.name()
    }

    fn full_name(&self) -> &str {
        self.parent.full_name()
    }

    fn dimensions(&self) -> &[Arc<Dimension>] {
        &self.dims
    }

    fn data_type(&self) -> DataType {
        self.parent.data_type()
    }

    fn raw_no_data(&self) -> Option<f64> {
        self.parent.raw_no_data()
    }

    fn unit(&self) -> Option<&str> {
        self.parent.unit()
    }

    fn spatial_ref(&self) -> Option<&str> {
        self.parent.spatial_ref()
    }

    fn block_size(&self) -> Vec<u64> {
        self.parent
            .block_size()
            .into_iter()
            .zip(&self.targeted)
            .map(|(b, &t)| if t { 1 } else { b })
            .collect()
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        window.validate(&self.shape())?;
        tracing::trace!(
            array = %self.parent.full_name(),
            start = ?window.start,
            count = ?window.count,
            "Subset read"
        );
        let outer_only = self.targeted[0] && !self.targeted[1..].iter().any(|&t| t);
        if outer_only {
            self.read_outer(window, dest)
        } else {
            self.read_general(window, dest)
        }
    }
}
