//! Orthorectification through a geolocation lookup table (GLT).
//!
//! Each output cell `(row, col)` samples the parent at
//! `(index_y[row][col] + offset, index_x[row][col] + offset)`. Cells whose
//! source pixel falls outside the parent are holes and receive NoData.
//!
//! ```text
//!   index_y / index_x window ──► + offset ──► in-range bounding rectangle
//!                                                   │
//!                             one parent read ◄─────┘
//!                                   │
//!                  scatter into dest, NoData for holes
//! ```

use std::sync::Arc;

use mdim_common::{
    for_each_index, regular_dimension, DataType, DestBuffer, Dimension, DimensionKind, MdArray,
    MdimError, MdimResult, Window,
};

use crate::types::GeoTransform;

/// Block size advertised on the two rectified axes.
const ORTHO_BLOCK_SIZE: u64 = 256;

/// A rectified view of a parent array addressed through two index arrays.
#[derive(Debug)]
pub struct OrthorectifiedArray {
    name: String,
    full_name: String,
    parent: Arc<dyn MdArray>,
    index_x: Arc<dyn MdArray>,
    index_y: Arc<dyn MdArray>,
    index_offset: i64,
    geo_transform: GeoTransform,
    dims: Vec<Arc<Dimension>>,
}

impl OrthorectifiedArray {
    /// Validate the inputs and build the view.
    ///
    /// The parent's first two axes are (Y, X); any further axes are carried
    /// through. Both index arrays must be 2-D, integer typed and of the same
    /// shape, which becomes the shape of the rectified axes.
    pub fn create(
        parent: Arc<dyn MdArray>,
        index_x: Arc<dyn MdArray>,
        index_y: Arc<dyn MdArray>,
        index_offset: i64,
        geo_transform: GeoTransform,
    ) -> MdimResult<Arc<Self>> {
        if parent.rank() < 2 {
            return Err(MdimError::invalid(format!(
                "Array {} must have at least 2 dimensions",
                parent.full_name()
            )));
        }
        if !parent.data_type().is_numeric() {
            return Err(MdimError::invalid(format!(
                "Array {} is not of numeric type",
                parent.full_name()
            )));
        }
        for index in [&index_x, &index_y] {
            if index.rank() != 2 {
                return Err(MdimError::invalid(format!(
                    "Index array {} is not 2 dimensional",
                    index.full_name()
                )));
            }
            if !index.data_type().is_integer() {
                return Err(MdimError::invalid(format!(
                    "Index array {} is not of integer type",
                    index.full_name()
                )));
            }
        }
        if index_x.shape() != index_y.shape() {
            return Err(MdimError::invalid(format!(
                "Index arrays {} and {} do not have the same shape",
                index_x.full_name(),
                index_y.full_name()
            )));
        }

        let out_shape = index_x.shape();
        let gt = geo_transform;
        let dim_y = regular_dimension(
            "/Y",
            DimensionKind::HorizontalY,
            out_shape[0],
            gt.row_center(0),
            gt.pixel_height,
        );
        let dim_x = regular_dimension(
            "/X",
            DimensionKind::HorizontalX,
            out_shape[1],
            gt.column_center(0),
            gt.pixel_width,
        );
        let mut dims = vec![dim_y, dim_x];
        dims.extend(parent.dimensions()[2..].iter().cloned());

        tracing::debug!(
            parent = %parent.full_name(),
            out_shape = ?out_shape,
            index_offset,
            "Created orthorectified view"
        );

        Ok(Arc::new(Self {
            name: parent.name().to_string(),
            full_name: parent.full_name().to_string(),
            parent,
            index_x,
            index_y,
            index_offset,
            geo_transform,
            dims,
        }))
    }

    pub fn parent(&self) -> &Arc<dyn MdArray> {
        &self.parent
    }

    pub fn index_offset(&self) -> i64 {
        self.index_offset
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn fill_value(&self) -> f64 {
        self.parent.raw_no_data().unwrap_or(0.0)
    }
}

/// Inclusive rectangle of in-range source indices.
#[derive(Debug, Clone, Copy)]
struct SourceRect {
    min_y: u64,
    max_y: u64,
    min_x: u64,
    max_x: u64,
}

impl SourceRect {
    fn include(rect: &mut Option<Self>, y: u64, x: u64) {
        *rect = Some(match *rect {
            None => SourceRect {
                min_y: y,
                max_y: y,
                min_x: x,
                max_x: x,
            },
            Some(r) => SourceRect {
                min_y: r.min_y.min(y),
                max_y: r.max_y.max(y),
                min_x: r.min_x.min(x),
                max_x: r.max_x.max(x),
            },
        });
    }

    fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }

    fn width(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize
    }
}

impl MdArray for OrthorectifiedArray {
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
        let mut block = vec![ORTHO_BLOCK_SIZE, ORTHO_BLOCK_SIZE];
        block.extend(self.parent.block_size().into_iter().skip(2));
        block
    }

    fn read(&self, window: &Window, dest: &mut DestBuffer<'_>) -> MdimResult<()> {
        window.validate(&self.shape())?;

        // Lookup table entries for the requested cells
        let spatial = Window::new(
            window.start[..2].to_vec(),
            window.count[..2].to_vec(),
            window.step[..2].to_vec(),
        );
        let gx = self.index_x.read_f64(&spatial)?;
        let gy = self.index_y.read_f64(&spatial)?;

        let parent_shape = self.parent.shape();
        let (src_h, src_w) = (parent_shape[0] as i64, parent_shape[1] as i64);
        let offset = self.index_offset;

        let sources: Vec<Option<(u64, u64)>> = gy
            .iter()
            .zip(&gx)
            .map(|(&y, &x)| {
                let sy = (y as i64).saturating_add(offset);
                let sx = (x as i64).saturating_add(offset);
                ((0..src_h).contains(&sy) && (0..src_w).contains(&sx))
                    .then_some((sy as u64, sx as u64))
            })
            .collect();

        let mut rect: Option<SourceRect> = None;
        for &(sy, sx) in sources.iter().flatten() {
            SourceRect::include(&mut rect, sy, sx);
        }

        let Some(rect) = rect else {
            tracing::warn!(
                array = %self.full_name,
                start = ?window.start,
                count = ?window.count,
                "Window maps entirely outside the parent array"
            );
            return dest.fill(&window.count, self.fill_value());
        };

        tracing::trace!(
            array = %self.full_name,
            rect = ?rect,
            "Reading parent bounding rectangle"
        );

        // One bulk read of the rectangle, trailing axes as requested
        let mut parent_window = Window::contiguous(
            vec![rect.min_y, rect.min_x],
            vec![rect.height(), rect.width()],
        );
        parent_window.start.extend_from_slice(&window.start[2..]);
        parent_window.count.extend_from_slice(&window.count[2..]);
        parent_window.step.extend_from_slice(&window.step[2..]);
        let block = self.parent.read_f64(&parent_window)?;

        // (dest offset, packed source offset) of every trailing element
        let trailing_count = &window.count[2..];
        let trailing_len: usize = trailing_count.iter().product();
        let mut trailing = Vec::with_capacity(trailing_len);
        {
            let dest_strides = &dest.strides()[2..];
            let mut flat = 0usize;
            for_each_index(trailing_count, |idx| {
                let d: isize = idx
                    .iter()
                    .zip(dest_strides)
                    .map(|(&i, &s)| i as isize * s)
                    .sum();
                trailing.push((d, flat));
                flat += 1;
                Ok(())
            })?;
        }

        let fill = self.fill_value();
        let out_w = window.count[1];
        let mut cell = vec![0usize; window.rank()];
        for (k, source) in sources.iter().enumerate() {
            cell[0] = k / out_w;
            cell[1] = k % out_w;
            let base = dest.offset_of(&cell);
            match source {
                Some((sy, sx)) => {
                    let row = (sy - rect.min_y) as usize;
                    let col = (sx - rect.min_x) as usize;
                    let src_base = (row * rect.width() + col) * trailing_len;
                    for &(d, s) in &trailing {
                        dest.write(base + d, block[src_base + s])?;
                    }
                }
                None => {
                    for &(d, _) in &trailing {
                        dest.write(base + d, fill)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdim_common::MemArray;

    fn dim(name: &str, size: u64) -> Arc<Dimension> {
        Arc::new(Dimension::new(name, DimensionKind::Other, size))
    }

    fn index(name: &str, values: &[f64]) -> Arc<dyn MdArray> {
        Arc::new(
            MemArray::from_values(name, vec![dim("/gy", 2), dim("/gx", 2)], DataType::Int32, values)
                .unwrap(),
        )
    }

    fn parent(no_data: Option<f64>) -> Arc<dyn MdArray> {
        let mut array = MemArray::from_values(
            "/p",
            vec![dim("/py", 2), dim("/px", 2)],
            DataType::Float32,
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        if let Some(nd) = no_data {
            array = array.with_no_data(nd);
        }
        Arc::new(array)
    }

    #[test]
    fn test_rejects_non_integer_index() {
        let gx: Arc<dyn MdArray> = Arc::new(
            MemArray::from_values("/gx", vec![dim("/a", 2), dim("/b", 2)], DataType::Float64, &[0.0; 4])
                .unwrap(),
        );
        let err = OrthorectifiedArray::create(
            parent(None),
            gx,
            index("/gy", &[0.0; 4]),
            0,
            GeoTransform::default(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_holes_without_parent_nodata_are_zero() {
        let view = OrthorectifiedArray::create(
            parent(None),
            index("/gx", &[0.0, 9.0, 1.0, 1.0]),
            index("/gy", &[0.0, 0.0, 1.0, 7.0]),
            0,
            GeoTransform::default(),
        )
        .unwrap();
        assert_eq!(view.raw_no_data(), None);
        assert_eq!(view.read_all_f64().unwrap(), vec![1.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn test_offset_and_coordinates() {
        let view = OrthorectifiedArray::create(
            parent(Some(-1.0)),
            index("/gx", &[1.0, 2.0, 1.0, 2.0]),
            index("/gy", &[1.0, 1.0, 2.0, 2.0]),
            -1,
            GeoTransform::new(100.0, 10.0, 50.0, -10.0),
        )
        .unwrap();
        assert_eq!(view.read_all_f64().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

        let dims = view.dimensions();
        assert_eq!(dims[0].name(), "Y");
        assert_eq!(dims[1].kind(), DimensionKind::HorizontalX);
        let xs = dims[1].indexing_variable().unwrap().read_all_f64().unwrap();
        assert_eq!(xs, vec![105.0, 115.0]);
        let ys = dims[0].indexing_variable().unwrap().read_all_f64().unwrap();
        assert_eq!(ys, vec![45.0, 35.0]);
        assert_eq!(view.block_size(), vec![256, 256]);
    }
}
