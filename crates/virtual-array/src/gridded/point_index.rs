//! R-tree over the scattered sample positions.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use mdim_common::BoundingBox;

/// A sample position and its offset along the source's point dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    pub x: f64,
    pub y: f64,
    pub index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index answering rectangle and nearest-neighbour queries.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
    extent: Option<BoundingBox>,
}

impl PointIndex {
    /// Index every sample whose coordinates are both finite.
    pub fn build(xs: &[f64], ys: &[f64]) -> Self {
        let points: Vec<IndexedPoint> = xs
            .iter()
            .zip(ys)
            .enumerate()
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(index, (&x, &y))| IndexedPoint { x, y, index })
            .collect();
        let extent = BoundingBox::from_points(xs, ys);
        Self {
            tree: RTree::bulk_load(points),
            extent,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Bounding rectangle of the indexed points.
    pub fn extent(&self) -> Option<BoundingBox> {
        self.extent
    }

    /// Points inside a rectangle, borders included.
    pub fn in_rect<'a>(&'a self, bbox: &BoundingBox) -> impl Iterator<Item = &'a IndexedPoint> + 'a {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        self.tree.locate_in_envelope(&envelope)
    }

    /// Every indexed point, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedPoint> {
        self.tree.iter()
    }

    /// Points ordered by increasing distance from `(x, y)`.
    pub fn nearest_iter(&self, x: f64, y: f64) -> impl Iterator<Item = &IndexedPoint> {
        self.tree.nearest_neighbor_iter(&[x, y])
    }

    /// Distance from a point to its closest distinct neighbour.
    pub fn nearest_distinct_distance(&self, point: &IndexedPoint) -> Option<f64> {
        self.tree
            .nearest_neighbor_iter(&[point.x, point.y])
            .map(|p| p.distance_2(&[point.x, point.y]))
            .find(|d2| *d2 > 0.0)
            .map(f64::sqrt)
    }
}

impl std::fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex")
            .field("len", &self.len())
            .field("extent", &self.extent)
            .finish()
    }
}
