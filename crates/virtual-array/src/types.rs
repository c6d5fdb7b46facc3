//! Core types shared by the derived arrays.

use serde::{Deserialize, Serialize};

use mdim_common::BoundingBox;

/// Origin and pixel spacing of a rectified output grid.
///
/// Coordinates refer to the outer corner of the first pixel; the values
/// exposed by indexing variables are pixel centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new geotransform.
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// X coordinate of the center of column `col`.
    pub fn column_center(&self, col: u64) -> f64 {
        self.origin_x + (col as f64 + 0.5) * self.pixel_width
    }

    /// Y coordinate of the center of row `row`.
    pub fn row_center(&self, row: u64) -> f64 {
        self.origin_y + (row as f64 + 0.5) * self.pixel_height
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        // Pixel space
        Self::new(0.0, 1.0, 0.0, 1.0)
    }
}

/// Placement of a regular grid synthesized from scattered points.
///
/// Node `(row, col)` sits at `(min_x + col * resolution, min_y + row * resolution)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub min_x: f64,
    pub min_y: f64,
    pub resolution: f64,
    pub width: u64,
    pub height: u64,
}

impl GridGeometry {
    /// X coordinate of column `col`.
    #[inline]
    pub fn node_x(&self, col: u64) -> f64 {
        self.min_x + col as f64 * self.resolution
    }

    /// Y coordinate of row `row`.
    #[inline]
    pub fn node_y(&self, row: u64) -> f64 {
        self.min_y + row as f64 * self.resolution
    }

    /// Rectangle spanned by the nodes of a rows × cols sub-grid.
    pub fn nodes_bbox(&self, rows: (u64, u64), cols: (u64, u64)) -> BoundingBox {
        let (x0, x1) = (self.node_x(cols.0), self.node_x(cols.1));
        let (y0, y1) = (self.node_y(rows.0), self.node_y(rows.1));
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

/// Statistics about a gridded view's slice cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Slice index currently held, if any.
    pub current_slice: Option<u64>,
}
