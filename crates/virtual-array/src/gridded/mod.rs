//! Dense rasters interpolated on demand from scattered points.
//!
//! The parent holds one value per point along its last dimension; two 1-D
//! arrays on that same dimension give the point coordinates. The view
//! replaces the point dimension by a regular `dimY` × `dimX` grid covering
//! the point extent.
//!
//! ```text
//! read(window)
//!      │
//!      ├─► leading indices ──► SliceCache ──(miss)──► parent 1-D read
//!      │
//!      ├─► window nodes ──► PointIndex rectangle query (+ search radius)
//!      │                    or nearest-k query (invdist max_points)
//!      │                    or slice TriangleMesh (linear)
//!      │
//!      └─► GridAlgorithm per node (row-parallel) ──► dest
//! ```

mod algorithm;
mod mesh;
mod options;
mod point_index;
mod resolution;

pub use algorithm::{AlgorithmKind, GridAlgorithm, Sample, SearchEllipse};
pub use mesh::TriangleMesh;
pub use options::GriddedOptions;
pub use point_index::{IndexedPoint, PointIndex};
pub use resolution::estimate_resolution;

use std::sync::Arc;

use rayon::prelude::*;

use mdim_common::{
    alloc_values, regular_dimension, BoundingBox, DataType, DestBuffer, Dimension, DimensionKind,
    MdArray, MdimError, MdimResult, Window,
};

use crate::cache::SliceCache;
use crate::config::VirtualArrayConfig;
use crate::types::{CacheStats, GridGeometry};

/// Minimum number of samples needed to grid.
const MIN_POINTS: u64 = 3;

/// Point values of one slice, triangulated when gridding with `linear`.
#[derive(Debug)]
struct SliceData {
    values: Vec<f64>,
    mesh: Option<TriangleMesh>,
}

/// A regular grid interpolated from a point cloud.
pub struct GriddedArray {
    name: String,
    full_name: String,
    parent: Arc<dyn MdArray>,
    x_array: Arc<dyn MdArray>,
    y_array: Arc<dyn MdArray>,
    dims: Vec<Arc<Dimension>>,
    algorithm: GridAlgorithm,
    geometry: GridGeometry,
    search_radius: f64,
    index: PointIndex,
    cache: SliceCache<SliceData>,
    block_size: u64,
}

impl GriddedArray {
    /// Validate the inputs, index the points and size the grid.
    pub fn create(
        parent: Arc<dyn MdArray>,
        algorithm_options: &str,
        x_array: Arc<dyn MdArray>,
        y_array: Arc<dyn MdArray>,
        options: &GriddedOptions,
        config: &VirtualArrayConfig,
    ) -> MdimResult<Arc<Self>> {
        options.validate()?;

        let point_dim = parent.dimensions().last().cloned().ok_or_else(|| {
            MdimError::invalid(format!("Array {} has no dimension", parent.full_name()))
        })?;
        if !parent.data_type().is_numeric() {
            return Err(MdimError::invalid(format!(
                "Array {} is not of numeric type",
                parent.full_name()
            )));
        }
        for (axis, coords) in [("X", &x_array), ("Y", &y_array)] {
            if coords.rank() != 1 {
                return Err(MdimError::invalid(format!(
                    "{} array {} is not single dimensional",
                    axis,
                    coords.full_name()
                )));
            }
            if !coords.data_type().is_numeric() {
                return Err(MdimError::invalid(format!(
                    "{} array {} is not of numeric type",
                    axis,
                    coords.full_name()
                )));
            }
            if !coords.dimensions()[0].same_axis(&point_dim) {
                return Err(MdimError::invalid(format!(
                    "{} array {} is not indexed by the last dimension of {}",
                    axis,
                    coords.full_name(),
                    parent.full_name()
                )));
            }
        }

        let n_points = point_dim.size();
        if n_points < MIN_POINTS {
            return Err(MdimError::invalid(format!(
                "At least {} points are needed, {} has {}",
                MIN_POINTS,
                point_dim.full_name(),
                n_points
            )));
        }
        if n_points > config.max_gridded_points && !options.accept_big_spatial_indexing_variable {
            return Err(MdimError::capacity(format!(
                "The spatial indexing variable has {} elements. \
                 Set the ACCEPT_BIG_SPATIAL_INDEXING_VARIABLE=YES option of GetGridded() \
                 to mean you want to continue and understand that it may take a long time",
                n_points
            )));
        }

        let algorithm = GridAlgorithm::parse(algorithm_options)?;

        let xs = x_array.read_all_f64()?;
        let ys = y_array.read_all_f64()?;
        let index = PointIndex::build(&xs, &ys);
        let extent = index.extent().ok_or_else(|| {
            MdimError::invalid(format!(
                "No point with valid coordinates in {} / {}",
                x_array.full_name(),
                y_array.full_name()
            ))
        })?;

        let resolution = match options.resolution {
            Some(res) => res,
            None => estimate_resolution(&index, config.resolution_sample_count)?,
        };
        let geometry = GridGeometry {
            min_x: extent.min_x,
            min_y: extent.min_y,
            resolution,
            width: grid_size(extent.width(), resolution)?,
            height: grid_size(extent.height(), resolution)?,
        };

        let search_radius = algorithm
            .radius
            .filter(|r| *r > 0.0)
            .unwrap_or(config.search_radius_factor * resolution);
        let algorithm = algorithm.resolve(search_radius);

        let mut dims: Vec<Arc<Dimension>> = parent.dimensions()[..parent.rank() - 1].to_vec();
        dims.push(regular_dimension(
            "/dimY",
            DimensionKind::HorizontalY,
            geometry.height,
            geometry.min_y,
            resolution,
        ));
        dims.push(regular_dimension(
            "/dimX",
            DimensionKind::HorizontalX,
            geometry.width,
            geometry.min_x,
            resolution,
        ));

        tracing::debug!(
            parent = %parent.full_name(),
            algorithm = %algorithm.kind,
            points = index.len(),
            resolution,
            width = geometry.width,
            height = geometry.height,
            search_radius,
            "Created gridded view"
        );

        Ok(Arc::new(Self {
            name: parent.name().to_string(),
            full_name: parent.full_name().to_string(),
            parent,
            x_array,
            y_array,
            dims,
            algorithm,
            geometry,
            search_radius,
            index,
            cache: SliceCache::new(),
            block_size: config.gridded_block_size,
        }))
    }

    pub fn parent(&self) -> &Arc<dyn MdArray> {
        &self.parent
    }

    pub fn x_array(&self) -> &Arc<dyn MdArray> {
        &self.x_array
    }

    pub fn y_array(&self) -> &Arc<dyn MdArray> {
        &self.y_array
    }

    pub fn algorithm(&self) -> &GridAlgorithm {
        &self.algorithm
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn search_radius(&self) -> f64 {
        self.search_radius
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Values of every point for the slice at `leading` indices.
    fn slice_data(&self, leading: &[u64]) -> MdimResult<Arc<SliceData>> {
        let parent_shape = self.parent.shape();
        let slice = leading
            .iter()
            .zip(&parent_shape)
            .fold(0u64, |acc, (&i, &n)| acc * n + i);

        self.cache.get_or_load(slice, || {
            let mut start = leading.to_vec();
            start.push(0);
            let mut count = vec![1usize; leading.len()];
            count.push(*parent_shape.last().unwrap_or(&0) as usize);
            tracing::trace!(array = %self.full_name, slice, "Loading point values");
            let values = self.parent.read_f64(&Window::contiguous(start, count))?;

            let mesh = match self.algorithm.kind {
                AlgorithmKind::Linear => {
                    let samples = self.collect_samples(self.index.iter(), &values);
                    let mesh = TriangleMesh::build(&samples)?;
                    tracing::debug!(
                        array = %self.full_name,
                        slice,
                        vertices = mesh.num_vertices(),
                        triangles = mesh.num_triangles(),
                        "Triangulated slice"
                    );
                    Some(mesh)
                }
                _ => None,
            };
            Ok(SliceData { values, mesh })
        })
    }

    /// Valid samples among `points`, in point order.
    fn collect_samples<'a>(
        &self,
        points: impl Iterator<Item = &'a IndexedPoint>,
        values: &[f64],
    ) -> Vec<Sample> {
        let no_data = self.parent.raw_no_data();
        let mut points: Vec<&IndexedPoint> = points.collect();
        points.sort_unstable_by_key(|p| p.index);
        points
            .into_iter()
            .filter_map(|p| {
                let z = values[p.index];
                is_valid(z, no_data).then_some(Sample { x: p.x, y: p.y, z })
            })
            .collect()
    }

    /// Samples usable by unbounded algorithms for nodes inside `nodes`.
    fn window_samples(&self, nodes: Option<BoundingBox>, values: &[f64]) -> Vec<Sample> {
        match nodes {
            None => self.collect_samples(self.index.iter(), values),
            Some(bbox) => {
                self.collect_samples(self.index.in_rect(&bbox.expand(self.search_radius)), values)
            }
        }
    }

    /// Value of the closest valid sample within `radius`, unbounded when 0.
    fn nearest_valid(&self, x: f64, y: f64, values: &[f64], radius: f64) -> f64 {
        let no_data = self.parent.raw_no_data();
        let radius2 = radius * radius;
        self.index
            .nearest_iter(x, y)
            .take_while(|p| radius <= 0.0 || distance2(p, x, y) <= radius2)
            .map(|p| values[p.index])
            .find(|z| is_valid(*z, no_data))
            .unwrap_or(self.algorithm.nodata)
    }

    /// The `limit` valid samples closest to `(x, y)` inside the search
    /// ellipse. Equidistant samples are taken by increasing point index.
    fn nearest_samples(&self, x: f64, y: f64, values: &[f64], limit: usize) -> Vec<Sample> {
        let no_data = self.parent.raw_no_data();
        let extent2 = self.algorithm.node_extent().map(|r| r * r);
        let mut picked: Vec<(f64, usize, Sample)> = Vec::with_capacity(limit + 1);
        for p in self.index.nearest_iter(x, y) {
            let d2 = distance2(p, x, y);
            if extent2.is_some_and(|e| d2 > e) {
                break;
            }
            if picked.len() >= limit && picked.last().is_some_and(|(last, _, _)| d2 > *last) {
                break;
            }
            let z = values[p.index];
            if !is_valid(z, no_data) || !self.algorithm.ellipse.contains(p.x - x, p.y - y) {
                continue;
            }
            picked.push((d2, p.index, Sample { x: p.x, y: p.y, z }));
        }
        picked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        picked.truncate(limit);
        picked.into_iter().map(|(_, _, sample)| sample).collect()
    }

    fn node_value(&self, x: f64, y: f64, window_samples: &[Sample], slice: &SliceData) -> f64 {
        let values = &slice.values;
        if let Some(mesh) = &slice.mesh {
            return match mesh.interpolate(x, y) {
                Some(z) => z,
                None if self.algorithm.linear_uses_nearest() => {
                    self.nearest_valid(x, y, values, self.algorithm.ellipse.radius1)
                }
                None => self.algorithm.nodata,
            };
        }
        if self.algorithm.is_unbounded_nearest() {
            return self.nearest_valid(x, y, values, 0.0);
        }
        if let Some(limit) = self.algorithm.nearest_points_limit() {
            let samples = self.nearest_samples(x, y, values, limit);
            return self.algorithm.evaluate(x, y, &samples);
        }
        match self.algorithm.node_extent() {
            Some(extent) => {
                let around = BoundingBox::new(x, y, x, y).expand(extent);
                let samples = self.collect_samples(self.index.in_rect(&around), values);
                self.algorithm.evaluate(x, y, &samples)
            }
            None => self.algorithm.evaluate(x, y, window_samples),
        }
    }

    /// Whether nodes are evaluated from samples gathered once per window.
    fn uses_window_samples(&self) -> bool {
        self.algorithm.node_extent().is_none()
            && !self.algorithm.is_unbounded_nearest()
            && self.algorithm.nearest_points_limit().is_none()
            && self.algorithm.kind != AlgorithmKind::Linear
    }
}

/// Number of grid nodes needed to span `extent` at `resolution`.
fn grid_size(extent: f64, resolution: f64) -> MdimResult<u64> {
    let nodes = (extent / resolution + 1.0 + 1e-6).trunc();
    if !nodes.is_finite() || nodes > i32::MAX as f64 {
        return Err(MdimError::invalid(format!(
            "Resolution {} is too small for an extent of {}",
            resolution, extent
        )));
    }
    Ok((nodes as u64).max(2))
}

#[inline]
fn distance2(p: &IndexedPoint, x: f64, y: f64) -> f64 {
    let (dx, dy) = (p.x - x, p.y - y);
    dx * dx + dy * dy
}

#[inline]
fn is_valid(z: f64, no_data: Option<f64>) -> bool {
    !z.is_nan() && no_data != Some(z)
}

impl std::fmt::Debug for GriddedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GriddedArray")
            .field("full_name", &self.full_name)
            .field("algorithm", &self.algorithm.kind)
            .field("geometry", &self.geometry)
            .field("index", &self.index)
            .finish()
    }
}

impl MdArray for GriddedArray {
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

    fn raw_no_data(&self) -> Option<f64> {
        self.algorithm
            .explicit_nodata
            .then_some(self.algorithm.nodata)
    }

    fn unit(&self) -> Option<&str> {
        self.parent.unit()
    }

    fn spatial_ref(&self) -> Option<&str> {
        self.parent.spatial_ref()
    }

    fn block_size(&self) -> Vec<u64> {
        let mut block = vec![0; self.dims.len() - 2];
        block.extend([self.block_size, self.block_size]);
        block
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        window.validate(&self.shape())?;
        let lead = self.dims.len() - 2;

        if window.count[..lead].iter().any(|&c| c != 1) {
            return Err(MdimError::not_supported(
                "Cannot read more than one sample in the non X/Y dimensions",
            ));
        }
        if window.step[lead..]
            .iter()
            .zip(&window.count[lead..])
            .any(|(&s, &c)| s < 0 || (s == 0 && c > 1))
        {
            return Err(MdimError::not_supported(
                "Only positive steps are supported on the X/Y dimensions",
            ));
        }

        let slice = self.slice_data(&window.start[..lead])?;

        let (rows, cols) = (window.count[lead], window.count[lead + 1]);
        let row_index = |i: usize| window.index(lead, i);
        let col_index = |j: usize| window.index(lead + 1, j);

        let full = window.start[lead..].iter().all(|&s| s == 0)
            && rows as u64 == self.geometry.height
            && cols as u64 == self.geometry.width
            && window.step[lead..].iter().all(|&s| s == 1);
        let nodes = (!full).then(|| {
            self.geometry
                .nodes_bbox((row_index(0), row_index(rows - 1)), (col_index(0), col_index(cols - 1)))
        });

        let window_samples = if self.uses_window_samples() {
            self.window_samples(nodes, &slice.values)
        } else {
            Vec::new()
        };
        tracing::trace!(
            array = %self.full_name,
            rows,
            cols,
            full,
            samples = window_samples.len(),
            "Gridding window"
        );

        let mut out = alloc_values(rows * cols, 0.0)?;
        out.par_chunks_mut(cols).enumerate().for_each(|(i, row)| {
            let y = self.geometry.node_y(row_index(i));
            for (j, cell) in row.iter_mut().enumerate() {
                let x = self.geometry.node_x(col_index(j));
                *cell = self.node_value(x, y, &window_samples, &slice);
            }
        });

        let mut idx = vec![0usize; self.dims.len()];
        for i in 0..rows {
            idx[lead] = i;
            for j in 0..cols {
                idx[lead + 1] = j;
                dest.write_at(&idx, out[i * cols + j])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size() {
        assert_eq!(grid_size(2.0, 1.0).unwrap(), 3);
        assert_eq!(grid_size(2.0, 0.5).unwrap(), 5);
        assert_eq!(grid_size(0.0, 1.0).unwrap(), 2);
        // 0.3 / 0.1 is slightly below 3
        assert_eq!(grid_size(0.3, 0.1).unwrap(), 4);
        assert!(grid_size(2.0, 1e-200).is_err());
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(1.0, None));
        assert!(!is_valid(f64::NAN, None));
        assert!(!is_valid(-9999.0, Some(-9999.0)));
    }
}
