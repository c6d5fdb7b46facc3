//! Delaunay triangulation of samples for the `linear` method.

use spade::{DelaunayTriangulation, HasPosition, Point2, PositionInTriangulation, Triangulation};

use mdim_common::{MdimError, MdimResult};

use super::Sample;

#[derive(Debug, Clone, Copy)]
struct Vertex {
    position: Point2<f64>,
    z: f64,
}

impl HasPosition for Vertex {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Triangulated samples interpolated from barycentric coordinates.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    triangulation: DelaunayTriangulation<Vertex>,
}

impl TriangleMesh {
    /// Triangulate `samples`. Coincident samples keep a single vertex.
    pub fn build(samples: &[Sample]) -> MdimResult<Self> {
        let vertices = samples
            .iter()
            .map(|s| Vertex {
                position: Point2::new(s.x, s.y),
                z: s.z,
            })
            .collect();
        let triangulation = DelaunayTriangulation::bulk_load(vertices)
            .map_err(|e| MdimError::invalid(format!("Cannot triangulate samples: {}", e)))?;
        Ok(Self { triangulation })
    }

    pub fn num_vertices(&self) -> usize {
        self.triangulation.num_vertices()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangulation.num_inner_faces()
    }

    /// Value at `(x, y)`, or `None` outside the convex hull.
    pub fn interpolate(&self, x: f64, y: f64) -> Option<f64> {
        let point = Point2::new(x, y);
        match self.triangulation.locate(point) {
            PositionInTriangulation::OnVertex(v) => Some(self.triangulation.vertex(v).data().z),
            PositionInTriangulation::OnEdge(e) => {
                let [a, b] = self.triangulation.directed_edge(e).vertices();
                Some(along_edge(a.data(), b.data(), point))
            }
            PositionInTriangulation::OnFace(f) => {
                let [a, b, c] = self.triangulation.face(f).vertices();
                Some(barycentric(a.data(), b.data(), c.data(), point))
            }
            PositionInTriangulation::OutsideOfConvexHull(_)
            | PositionInTriangulation::NoTriangulation => None,
        }
    }
}

fn along_edge(a: &Vertex, b: &Vertex, p: Point2<f64>) -> f64 {
    let (dx, dy) = (b.position.x - a.position.x, b.position.y - a.position.y);
    let t = ((p.x - a.position.x) * dx + (p.y - a.position.y) * dy) / (dx * dx + dy * dy);
    a.z + t * (b.z - a.z)
}

fn barycentric(a: &Vertex, b: &Vertex, c: &Vertex, p: Point2<f64>) -> f64 {
    let (pa, pb, pc) = (a.position, b.position, c.position);
    let det = (pb.y - pc.y) * (pa.x - pc.x) + (pc.x - pb.x) * (pa.y - pc.y);
    let l1 = ((pb.y - pc.y) * (p.x - pc.x) + (pc.x - pb.x) * (p.y - pc.y)) / det;
    let l2 = ((pc.y - pa.y) * (p.x - pc.x) + (pa.x - pc.x) * (p.y - pc.y)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * a.z + l2 * b.z + l3 * c.z
}
