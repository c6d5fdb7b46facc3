//! Hyper-rectangular read windows.

use crate::error::{MdimError, MdimResult};

/// A windowed read request: per-axis start index, element count and step.
///
/// Steps may be negative, in which case the window walks the axis backwards
/// from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub start: Vec<u64>,
    pub count: Vec<usize>,
    pub step: Vec<i64>,
}

impl Window {
    /// Create a window from explicit per-axis values.
    pub fn new(start: Vec<u64>, count: Vec<usize>, step: Vec<i64>) -> Self {
        Self { start, count, step }
    }

    /// Window with unit steps.
    pub fn contiguous(start: Vec<u64>, count: Vec<usize>) -> Self {
        let step = vec![1; start.len()];
        Self { start, count, step }
    }

    /// Window covering a whole array of the given shape.
    pub fn full(shape: &[u64]) -> Self {
        Self {
            start: vec![0; shape.len()],
            count: shape.iter().map(|&s| s as usize).collect(),
            step: vec![1; shape.len()],
        }
    }

    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Number of elements the window selects (1 for rank 0).
    pub fn element_count(&self) -> usize {
        self.count.iter().product()
    }

    /// Array index touched by the `i`-th element along `axis`.
    #[inline]
    pub fn index(&self, axis: usize, i: usize) -> u64 {
        (self.start[axis] as i64 + i as i64 * self.step[axis]) as u64
    }

    /// True when the window selects every element of `shape` in storage order.
    pub fn is_full(&self, shape: &[u64]) -> bool {
        self.rank() == shape.len()
            && self
                .start
                .iter()
                .zip(&self.count)
                .zip(&self.step)
                .zip(shape)
                .all(|(((&s, &c), &st), &n)| s == 0 && c as u64 == n && (st == 1 || c <= 1))
    }

    /// Check the window against an array shape.
    pub fn validate(&self, shape: &[u64]) -> MdimResult<()> {
        if self.count.len() != self.rank() || self.step.len() != self.rank() {
            return Err(MdimError::invalid(
                "start, count and step must have the same length",
            ));
        }
        if self.rank() != shape.len() {
            return Err(MdimError::invalid(format!(
                "window rank {} does not match array rank {}",
                self.rank(),
                shape.len()
            )));
        }
        for axis in 0..self.rank() {
            let size = shape[axis];
            let count = self.count[axis];
            if count == 0 {
                return Err(MdimError::invalid(format!("count[{}] is zero", axis)));
            }
            if self.start[axis] >= size {
                return Err(MdimError::invalid(format!(
                    "start[{}] = {} is beyond dimension size {}",
                    axis, self.start[axis], size
                )));
            }
            let last = self.start[axis] as i128
                + (count as i128 - 1) * self.step[axis] as i128;
            if last < 0 || last >= size as i128 {
                return Err(MdimError::invalid(format!(
                    "window on axis {} ends at {} outside [0, {})",
                    axis, last, size
                )));
            }
        }
        Ok(())
    }
}

/// Visit every index tuple of a `count` box in C order.
///
/// Rank 0 visits the empty tuple once; any zero count visits nothing.
pub fn for_each_index<F>(count: &[usize], mut f: F) -> MdimResult<()>
where
    F: FnMut(&[usize]) -> MdimResult<()>,
{
    if count.iter().any(|&c| c == 0) {
        return Ok(());
    }
    let mut idx = vec![0usize; count.len()];
    loop {
        f(&idx)?;
        let mut axis = count.len();
        loop {
            if axis == 0 {
                return Ok(());
            }
            axis -= 1;
            idx[axis] += 1;
            if idx[axis] < count[axis] {
                break;
            }
            idx[axis] = 0;
        }
    }
}

/// Row-major element strides for a packed buffer of the given counts.
pub fn packed_strides(count: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; count.len()];
    for axis in (0..count.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * count[axis + 1] as isize;
    }
    strides
}
