//! Cell size estimation for point clouds without an explicit resolution.

use mdim_common::{MdimError, MdimResult};

use super::point_index::{IndexedPoint, PointIndex};

/// Estimate a grid resolution from the spacing of the points.
///
/// The first guess assumes an even spread, `sqrt(area / n)`. It is refined
/// with the geometric mean of the nearest-neighbour distances of up to
/// `sample_count` points picked at regular offsets along the point dimension,
/// which keeps clustered clouds from producing oversized cells.
pub fn estimate_resolution(index: &PointIndex, sample_count: usize) -> MdimResult<f64> {
    let extent = index
        .extent()
        .ok_or_else(|| MdimError::invalid("No point with valid coordinates"))?;
    let n = index.len();

    let initial = if extent.area() > 0.0 {
        (extent.area() / n as f64).sqrt()
    } else {
        // Collinear points
        extent.width().max(extent.height()) / n.saturating_sub(1).max(1) as f64
    };

    let mut points: Vec<&IndexedPoint> = index.iter().collect();
    points.sort_unstable_by_key(|p| p.index);
    let step = (n / sample_count.max(1)).max(1);

    let (log_sum, count) = points
        .iter()
        .step_by(step)
        .take(sample_count.max(1))
        .filter_map(|p| index.nearest_distinct_distance(p))
        .filter(|d| d.is_finite() && *d > 0.0)
        .fold((0.0, 0usize), |(s, c), d| (s + d.ln(), c + 1));

    let resolution = if count > 0 {
        (log_sum / count as f64).exp()
    } else {
        initial
    };

    tracing::debug!(
        points = n,
        initial,
        samples = count,
        resolution,
        "Estimated gridding resolution"
    );

    if resolution.is_finite() && resolution > 0.0 {
        Ok(resolution)
    } else {
        Err(MdimError::invalid(
            "Cannot estimate a resolution: all points are coincident",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_grid(nx: usize, ny: usize, spacing: f64) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                xs.push(10.0 + i as f64 * spacing);
                ys.push(-5.0 + j as f64 * spacing);
            }
        }
        (xs, ys)
    }

    #[test]
    fn test_regular_grid_spacing_recovered() {
        let (xs, ys) = regular_grid(20, 15, 0.25);
        let res = estimate_resolution(&PointIndex::build(&xs, &ys), 10).unwrap();
        assert!((res - 0.25).abs() < 1e-9, "got {}", res);
    }

    #[test]
    fn test_clustered_cloud() {
        // Two tight clusters far apart
        let xs = [0.0, 0.1, 0.0, 0.1, 100.0, 100.1, 100.0, 100.1];
        let ys = [0.0, 0.0, 0.1, 0.1, 100.0, 100.0, 100.1, 100.1];
        let res = estimate_resolution(&PointIndex::build(&xs, &ys), 10).unwrap();
        assert!((res - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_points_fail() {
        let idx = PointIndex::build(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]);
        assert!(estimate_resolution(&idx, 10).is_err());
    }

    #[test]
    fn test_six_point_cloud() {
        let idx = PointIndex::build(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0], &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let res = estimate_resolution(&idx, 10).unwrap();
        assert!((res - 1.0).abs() < 1e-12);
    }
}
