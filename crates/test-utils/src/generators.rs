//! Generators for predictable, verifiable test data.

use std::sync::Arc;

use mdim_common::{DataType, Dimension, DimensionKind, MemArray, MdimResult};

/// Creates raster values where each cell is `row * 1000 + col`.
///
/// Makes it easy to check which source pixel ended up where.
///
/// # Example
///
/// ```
/// use test_utils::index_raster;
///
/// let grid = index_raster(2, 3);
/// assert_eq!(grid, vec![0.0, 1.0, 2.0, 1000.0, 1001.0, 1002.0]);
/// ```
pub fn index_raster(rows: usize, cols: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push((row * 1000 + col) as f64);
        }
    }
    data
}

/// Builds an in-memory `[Y, X]` array filled by [`index_raster`].
pub fn index_raster_array(
    full_name: &str,
    rows: u64,
    cols: u64,
    data_type: DataType,
) -> MdimResult<Arc<MemArray>> {
    let y = Arc::new(Dimension::new("/src_y", DimensionKind::HorizontalY, rows));
    let x = Arc::new(Dimension::new("/src_x", DimensionKind::HorizontalX, cols));
    let values = index_raster(rows as usize, cols as usize);
    Ok(Arc::new(MemArray::from_values(full_name, vec![y, x], data_type, &values)?))
}

/// Coordinates of an `nx` × `ny` regular point grid with spacing `step`,
/// X varying fastest.
///
/// # Example
///
/// ```
/// use test_utils::regular_points;
///
/// let (xs, ys) = regular_points(2, 2, 0.5);
/// assert_eq!(xs, vec![0.0, 0.5, 0.0, 0.5]);
/// assert_eq!(ys, vec![0.0, 0.0, 0.5, 0.5]);
/// ```
pub fn regular_points(nx: usize, ny: usize, step: f64) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(nx * ny);
    let mut ys = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            xs.push(i as f64 * step);
            ys.push(j as f64 * step);
        }
    }
    (xs, ys)
}

/// Deterministic pseudo-random values in `[0, 1)`.
///
/// A small linear congruential sequence, stable across platforms.
pub fn pseudo_random(count: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdim_common::MdArray;

    #[test]
    fn test_index_raster() {
        let grid = index_raster(3, 4);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[5], 1001.0);
        assert_eq!(grid[11], 2003.0);
    }

    #[test]
    fn test_index_raster_array() {
        let array = index_raster_array("/r", 2, 2, DataType::UInt16).unwrap();
        assert_eq!(array.read_all_f64().unwrap(), vec![0.0, 1.0, 1000.0, 1001.0]);
    }

    #[test]
    fn test_regular_points() {
        let (xs, ys) = regular_points(3, 2, 1.0);
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(ys, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_pseudo_random_is_deterministic() {
        let a = pseudo_random(5, 42);
        assert_eq!(a, pseudo_random(5, 42));
        assert!(a.iter().all(|v| (0.0..1.0).contains(v)));
        assert_ne!(a, pseudo_random(5, 43));
    }
}
