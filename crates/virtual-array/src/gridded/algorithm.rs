//! Interpolation algorithms evaluating one grid node from nearby samples.
//!
//! Algorithms are selected with `name[:key=value]*`, e.g.
//! `invdist:power=2:nodata=0` or `average:radius1=1:radius2=1`.
//!
//! Every algorithm except `invdistnn` and `linear` restricts itself to a
//! search ellipse of semi-axes `radius1` (X) and `radius2` (Y) rotated by
//! `angle` degrees. Zero radii select every sample handed to the algorithm.
//!
//! `linear` interpolates inside a Delaunay triangulation of the samples.
//! Outside of it, the nearest sample within `radius` is used, any sample when
//! `radius` is negative (the default), and nodata when `radius` is 0.

use std::fmt;

use mdim_common::{MdimError, MdimResult};

use super::mesh::TriangleMesh;

/// Distance² under which a sample is considered to sit on the node.
const COINCIDENT_DISTANCE2: f64 = 1e-13;

/// Default number of neighbours used by `invdistnn`.
const DEFAULT_NN_MAX_POINTS: usize = 12;

/// A scattered sample with its value for the current slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Supported gridding methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    InverseDistance,
    InverseDistanceNearest,
    Average,
    Nearest,
    Minimum,
    Maximum,
    Range,
    Count,
    AverageDistance,
    AverageDistancePts,
    Linear,
}

impl AlgorithmKind {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "invdist" => Self::InverseDistance,
            "invdistnn" => Self::InverseDistanceNearest,
            "average" => Self::Average,
            "nearest" => Self::Nearest,
            "minimum" => Self::Minimum,
            "maximum" => Self::Maximum,
            "range" => Self::Range,
            "count" => Self::Count,
            "average_distance" => Self::AverageDistance,
            "average_distance_pts" => Self::AverageDistancePts,
            "linear" => Self::Linear,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InverseDistance => "invdist",
            Self::InverseDistanceNearest => "invdistnn",
            Self::Average => "average",
            Self::Nearest => "nearest",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Range => "range",
            Self::Count => "count",
            Self::AverageDistance => "average_distance",
            Self::AverageDistancePts => "average_distance_pts",
            Self::Linear => "linear",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rotated search ellipse centred on the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchEllipse {
    pub radius1: f64,
    pub radius2: f64,
    /// Rotation in degrees, counter-clockwise.
    pub angle: f64,
}

impl SearchEllipse {
    /// Offsets `(dx, dy)` in the ellipse frame.
    #[inline]
    fn rotate(&self, dx: f64, dy: f64) -> (f64, f64) {
        if self.angle == 0.0 {
            return (dx, dy);
        }
        let (sin, cos) = self.angle.to_radians().sin_cos();
        (dx * cos + dy * sin, dy * cos - dx * sin)
    }

    /// True when the offset lies inside (or on) the ellipse.
    #[inline]
    pub fn contains(&self, dx: f64, dy: f64) -> bool {
        let (rx, ry) = self.rotate(dx, dy);
        let r1 = self.radius1 * self.radius1;
        let r2 = self.radius2 * self.radius2;
        r2 * rx * rx + r1 * ry * ry <= r1 * r2
    }

    /// Half-width of a square enclosing the ellipse, when bounded.
    pub fn extent(&self) -> Option<f64> {
        (self.radius1 > 0.0 && self.radius2 > 0.0).then(|| self.radius1.max(self.radius2))
    }
}

/// A parsed gridding algorithm and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAlgorithm {
    pub kind: AlgorithmKind,
    pub ellipse: SearchEllipse,
    pub power: f64,
    pub smoothing: f64,
    /// 0 means unlimited.
    pub max_points: usize,
    pub min_points: usize,
    pub nodata: f64,
    /// Whether `nodata` was given explicitly.
    pub explicit_nodata: bool,
    /// Value of the `radius` key, if any.
    pub radius: Option<f64>,
}

impl GridAlgorithm {
    /// Parse an algorithm description.
    pub fn parse(text: &str) -> MdimResult<Self> {
        let mut parts = text.split(':');
        let name = parts.next().unwrap_or_default().trim();
        let kind = AlgorithmKind::from_name(name).ok_or_else(|| {
            MdimError::invalid(format!("Unsupported gridding method \"{}\"", name))
        })?;

        let mut algorithm = Self {
            kind,
            ellipse: SearchEllipse {
                radius1: 0.0,
                radius2: 0.0,
                angle: 0.0,
            },
            power: 2.0,
            smoothing: 0.0,
            max_points: match kind {
                AlgorithmKind::InverseDistanceNearest => DEFAULT_NN_MAX_POINTS,
                _ => 0,
            },
            min_points: 0,
            nodata: 0.0,
            explicit_nodata: false,
            radius: None,
        };

        let mut radius1 = None;
        let mut radius2 = None;
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value: f64 = value.trim().parse().map_err(|_| {
                MdimError::invalid(format!(
                    "Invalid value '{}' for gridding parameter {}",
                    value, key
                ))
            })?;
            match key.as_str() {
                "power" => algorithm.power = value,
                "smoothing" => algorithm.smoothing = value,
                "radius1" => radius1 = Some(value),
                "radius2" => radius2 = Some(value),
                "radius" => algorithm.radius = Some(value),
                "angle" => algorithm.ellipse.angle = value,
                "max_points" => algorithm.max_points = value.max(0.0) as usize,
                "min_points" => algorithm.min_points = value.max(0.0) as usize,
                "nodata" => {
                    algorithm.nodata = value;
                    algorithm.explicit_nodata = true;
                }
                other => tracing::debug!(key = other, "Ignoring unknown gridding parameter"),
            }
        }

        // `radius` stands for both semi-axes unless they are given
        let fallback = match kind {
            AlgorithmKind::InverseDistanceNearest => None,
            AlgorithmKind::Linear => algorithm.radius.map(|r| r.max(0.0)),
            _ => algorithm.radius,
        };
        algorithm.ellipse.radius1 = radius1.or(fallback).unwrap_or(0.0);
        algorithm.ellipse.radius2 = radius2.or(fallback).unwrap_or(0.0);
        Ok(algorithm)
    }

    /// Resolve parameters that depend on the grid.
    ///
    /// `invdistnn` without an explicit radius searches within `search_radius`.
    pub fn resolve(mut self, search_radius: f64) -> Self {
        if self.kind == AlgorithmKind::InverseDistanceNearest && self.radius.is_none() {
            self.radius = Some(search_radius);
        }
        self
    }

    /// Half-width of the square around a node outside of which samples can
    /// never contribute, when bounded.
    pub fn node_extent(&self) -> Option<f64> {
        match self.kind {
            AlgorithmKind::InverseDistanceNearest => self.radius.filter(|r| *r > 0.0),
            AlgorithmKind::Linear => None,
            _ => self.ellipse.extent(),
        }
    }

    /// Number of nearest samples `invdist` is limited to, if any.
    pub fn nearest_points_limit(&self) -> Option<usize> {
        (self.kind == AlgorithmKind::InverseDistance && self.max_points > 0)
            .then_some(self.max_points)
    }

    /// Whether `linear` uses the nearest sample outside the triangulation.
    pub fn linear_uses_nearest(&self) -> bool {
        self.radius.unwrap_or(-1.0) != 0.0
    }

    /// Value of a node outside the triangulation for `linear`.
    pub fn outside_hull(&self, x: f64, y: f64, samples: &[Sample]) -> f64 {
        if self.linear_uses_nearest() {
            self.nearest(x, y, samples)
        } else {
            self.nodata
        }
    }

    /// True for an unbounded nearest neighbour search.
    pub fn is_unbounded_nearest(&self) -> bool {
        self.kind == AlgorithmKind::Nearest
            && self.ellipse.radius1 == 0.0
            && self.ellipse.radius2 == 0.0
    }

    /// Compute the value of the node at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64, samples: &[Sample]) -> f64 {
        match self.kind {
            AlgorithmKind::InverseDistance => self.inverse_distance(x, y, samples),
            AlgorithmKind::InverseDistanceNearest => self.inverse_distance_nearest(x, y, samples),
            AlgorithmKind::Average => {
                let (sum, n) = self
                    .in_ellipse(x, y, samples)
                    .fold((0.0, 0usize), |(s, n), p| (s + p.z, n + 1));
                self.metric(n, || sum / n as f64)
            }
            AlgorithmKind::Nearest => self.nearest(x, y, samples),
            AlgorithmKind::Minimum => {
                let (min, n) = self
                    .in_ellipse(x, y, samples)
                    .fold((f64::INFINITY, 0usize), |(m, n), p| (m.min(p.z), n + 1));
                self.metric(n, || min)
            }
            AlgorithmKind::Maximum => {
                let (max, n) = self
                    .in_ellipse(x, y, samples)
                    .fold((f64::NEG_INFINITY, 0usize), |(m, n), p| (m.max(p.z), n + 1));
                self.metric(n, || max)
            }
            AlgorithmKind::Range => {
                let (min, max, n) = self.in_ellipse(x, y, samples).fold(
                    (f64::INFINITY, f64::NEG_INFINITY, 0usize),
                    |(lo, hi, n), p| (lo.min(p.z), hi.max(p.z), n + 1),
                );
                self.metric(n, || max - min)
            }
            AlgorithmKind::Count => {
                let n = self.in_ellipse(x, y, samples).count();
                if n < self.min_points {
                    self.nodata
                } else {
                    n as f64
                }
            }
            AlgorithmKind::AverageDistance => {
                let (sum, n) = self.in_ellipse(x, y, samples).fold((0.0, 0usize), |(s, n), p| {
                    let (rx, ry) = self.ellipse.rotate(p.x - x, p.y - y);
                    (s + (rx * rx + ry * ry).sqrt(), n + 1)
                });
                self.metric(n, || sum / n as f64)
            }
            AlgorithmKind::AverageDistancePts => {
                let inside: Vec<&Sample> = self.in_ellipse(x, y, samples).collect();
                let mut sum = 0.0;
                let mut pairs = 0usize;
                for (i, a) in inside.iter().enumerate() {
                    for b in &inside[i + 1..] {
                        sum += (b.x - a.x).hypot(b.y - a.y);
                        pairs += 1;
                    }
                }
                self.metric(pairs, || sum / pairs as f64)
            }
            AlgorithmKind::Linear => TriangleMesh::build(samples)
                .ok()
                .and_then(|mesh| mesh.interpolate(x, y))
                .unwrap_or_else(|| self.outside_hull(x, y, samples)),
        }
    }

    fn in_ellipse<'a>(
        &'a self,
        x: f64,
        y: f64,
        samples: &'a [Sample],
    ) -> impl Iterator<Item = &'a Sample> + 'a {
        samples
            .iter()
            .filter(move |p| self.ellipse.contains(p.x - x, p.y - y))
    }

    /// NoData unless at least `min_points` (and at least one) contributed.
    #[inline]
    fn metric(&self, n: usize, value: impl FnOnce() -> f64) -> f64 {
        if n == 0 || n < self.min_points {
            self.nodata
        } else {
            value()
        }
    }

    /// With `max_points`, only the closest samples count. Samples at the
    /// same distance keep their order in `samples`.
    fn inverse_distance(&self, x: f64, y: f64, samples: &[Sample]) -> f64 {
        let smoothing2 = self.smoothing * self.smoothing;
        let mut neighbours: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|p| {
                let (dx, dy) = (p.x - x, p.y - y);
                self.ellipse
                    .contains(dx, dy)
                    .then(|| (dx * dx + dy * dy + smoothing2, p.z))
            })
            .collect();
        if self.max_points > 0 && neighbours.len() > self.max_points {
            neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
            neighbours.truncate(self.max_points);
        }
        if let Some(&(_, z)) = neighbours.iter().find(|(r2, _)| *r2 < COINCIDENT_DISTANCE2) {
            return z;
        }
        self.weighted(&neighbours)
    }

    fn inverse_distance_nearest(&self, x: f64, y: f64, samples: &[Sample]) -> f64 {
        let radius = self.radius.unwrap_or(0.0);
        let radius2 = radius * radius;
        let smoothing2 = self.smoothing * self.smoothing;

        let mut neighbours: Vec<(f64, f64)> = Vec::new();
        for p in samples {
            let (dx, dy) = (p.x - x, p.y - y);
            let r2 = dx * dx + dy * dy;
            if r2 > radius2 {
                continue;
            }
            let smoothed = r2 + smoothing2;
            if smoothed < COINCIDENT_DISTANCE2 {
                return p.z;
            }
            neighbours.push((smoothed, p.z));
        }
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        if self.max_points > 0 {
            neighbours.truncate(self.max_points);
        }
        self.weighted(&neighbours)
    }

    /// Inverse distance weighting of `(distance², value)` pairs.
    fn weighted(&self, neighbours: &[(f64, f64)]) -> f64 {
        let half_power = self.power / 2.0;
        let (nominator, denominator) = neighbours.iter().fold((0.0, 0.0), |(num, den), (r2, z)| {
            let inv_w = 1.0 / r2.powf(half_power);
            (num + inv_w * z, den + inv_w)
        });
        if neighbours.len() < self.min_points || denominator == 0.0 {
            self.nodata
        } else {
            nominator / denominator
        }
    }

    fn nearest(&self, x: f64, y: f64, samples: &[Sample]) -> f64 {
        let mut best = self.nodata;
        let mut best_r2 = f64::MAX;
        for p in samples {
            let (dx, dy) = (p.x - x, p.y - y);
            if !self.ellipse.contains(dx, dy) {
                continue;
            }
            let r2 = dx * dx + dy * dy;
            if r2 <= best_r2 {
                best_r2 = r2;
                best = p.z;
            }
        }
        best
    }
}
