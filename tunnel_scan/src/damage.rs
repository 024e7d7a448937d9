//! Surface damage detection.
//!
//! The dominant plane of a local point patch is treated as the intact
//! surface; points off that plane are reported as damage together with the
//! size of the damaged region.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::cloud::PointSet;
use crate::config::ClassifierConfig;
use crate::error::{Result, ScanError};
use crate::geometry::{plane::centroid, Plane, Point};
use crate::progress::Monitor;
use crate::ransac::{segment_plane, RansacParams};

/// Oriented size of the damaged region, measured in the surface frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DamageExtent {
    /// Longer in-plane side.
    pub length: f64,
    /// Shorter in-plane side.
    pub width: f64,
    /// Spread of distances from the surface.
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageReport {
    pub surface: Plane,
    pub surface_points: usize,
    /// Indices of points off the surface, ascending.
    pub damage_indices: Vec<usize>,
    /// Largest distance of a damage point from the surface.
    pub max_distance: f64,
    /// `None` when fewer than two damage points exist.
    pub extent: Option<DamageExtent>,
}

impl DamageReport {
    pub fn damage_ratio(&self) -> f64 {
        let total = self.surface_points + self.damage_indices.len();
        if total == 0 {
            0.0
        } else {
            self.damage_indices.len() as f64 / total as f64
        }
    }
}

fn oriented_extent(points: &[Point]) -> (f64, f64) {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy) = (p.x - cx, p.y - cy);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (s, c) = theta.sin_cos();
    let (mut amin, mut amax, mut bmin, mut bmax) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        let a = p.x * c + p.y * s;
        let b = -p.x * s + p.y * c;
        amin = amin.min(a);
        amax = amax.max(a);
        bmin = bmin.min(b);
        bmax = bmax.max(b);
    }
    let (first, second) = (amax - amin, bmax - bmin);
    (first.max(second), first.min(second))
}

/// Finds the dominant surface of `points` and the points deviating from it.
///
/// Fails with [`ScanError::NoDominantSurface`] when the best plane has fewer
/// than `config.min_plane_points` inliers.
pub fn detect_damage(points: &PointSet, config: &ClassifierConfig, monitor: &Monitor) -> Result<DamageReport> {
    config.validate()?;
    let coords = points.points();
    let candidates: Vec<usize> = (0..coords.len()).collect();
    let params = RansacParams {
        distance: config.ransac_distance,
        max_iterations: config.ransac_iterations,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    monitor.report(0, 2, "Fitting dominant surface");
    let model = segment_plane(coords, &candidates, &params, &mut rng, monitor)?;
    let inliers = model.as_ref().map_or(0, |m| m.inliers.len());
    let Some(model) = model.filter(|m| m.inliers.len() >= config.min_plane_points) else {
        return Err(ScanError::NoDominantSurface {
            inliers,
            required: config.min_plane_points,
        });
    };

    monitor.report(1, 2, "Measuring damage");
    let mut is_inlier = vec![false; coords.len()];
    for &i in &model.inliers {
        is_inlier[i] = true;
    }
    let damage_indices: Vec<usize> = (0..coords.len()).filter(|&i| !is_inlier[i]).collect();
    let distances: Vec<f64> = damage_indices
        .iter()
        .map(|&i| model.plane.signed_distance(coords[i]))
        .collect();
    let max_distance = distances.iter().map(|d| d.abs()).fold(0.0, f64::max);

    let extent = if damage_indices.len() >= 2 {
        let damaged: Vec<_> = damage_indices.iter().map(|&i| coords[i]).collect();
        let frame = model.plane.frame(centroid(&damaged));
        let flat: Vec<Point> = damaged.iter().map(|p| frame.project(*p)).collect();
        let (length, width) = oriented_extent(&flat);
        let lo = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(DamageExtent {
            length,
            width,
            depth: hi - lo,
        })
    } else {
        None
    };
    monitor.report(2, 2, "Damage analysis complete");
    info!(
        "Damage analysis: {} surface points, {} damage points, max distance {:.3} m",
        model.inliers.len(),
        damage_indices.len(),
        max_distance
    );
    Ok(DamageReport {
        surface: model.plane,
        surface_points: model.inliers.len(),
        damage_indices,
        max_distance,
        extent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    fn wall_with_spall() -> PointSet {
        let mut pts = Vec::new();
        for i in 0..30 {
            for k in 0..30 {
                let y = i as f64 * 0.1;
                let z = k as f64 * 0.1;
                // A 0.8 x 0.4 m patch recessed 0.3 m into the wall.
                let spalled = (1.0..1.75).contains(&y) && (1.0..1.35).contains(&z);
                let x = if spalled { -0.3 } else { 0.0 };
                pts.push(Point3::new(x, y, z));
            }
        }
        PointSet::new(pts)
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig {
            min_plane_points: 100,
            ..Default::default()
        }
    }

    #[test]
    fn finds_recessed_patch() {
        let report = detect_damage(&wall_with_spall(), &config(), &Monitor::new()).unwrap();
        assert_eq!(report.damage_indices.len(), 8 * 4);
        assert_eq!(report.surface_points, 900 - 32);
        assert!((report.max_distance - 0.3).abs() < 1e-9);
        let extent = report.extent.unwrap();
        assert!((extent.length - 0.7).abs() < 1e-6);
        assert!((extent.width - 0.3).abs() < 1e-6);
        assert!(extent.depth < 1e-9);
    }

    #[test]
    fn scattered_points_have_no_dominant_surface() {
        let pts: Vec<Point3> = (0..50)
            .map(|i| {
                let t = i as f64;
                Point3::new(t.sin() * 10.0, (t * 1.7).cos() * 10.0, t * 0.37 % 5.0)
            })
            .collect();
        let err = detect_damage(&PointSet::new(pts), &config(), &Monitor::new()).unwrap_err();
        assert!(matches!(err, ScanError::NoDominantSurface { required: 100, .. }));
    }
}
