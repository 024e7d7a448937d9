//! RANSAC plane segmentation.
//!
//! Robustly fits a plane to noisy point data by sampling minimal
//! three-point sets and keeping the plane with the largest consensus.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::geometry::{Plane, Point3};
use crate::progress::Monitor;

/// Sampling parameters for a single plane search.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacParams {
    /// Distance threshold for classifying inliers.
    pub distance: f64,
    /// Maximum number of minimal samples drawn.
    pub max_iterations: usize,
    /// Probability of having drawn at least one outlier-free sample before
    /// sampling stops early.
    pub confidence: f64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            distance: 0.1,
            max_iterations: 1000,
            confidence: 0.999_999,
        }
    }
}

/// Plane found by RANSAC together with its consensus set.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneModel {
    pub plane: Plane,
    /// Indices of inlier points, ascending.
    pub inliers: Vec<usize>,
    /// Inliers divided by the number of candidate points.
    pub inlier_ratio: f64,
    /// Mean absolute distance of the inliers from the plane.
    pub mean_residual: f64,
    /// Number of samples drawn.
    pub iterations: usize,
}

fn consensus(points: &[Point3], candidates: &[usize], plane: &Plane, distance: f64) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| plane.distance(points[i]) <= distance)
        .collect()
}

fn required_iterations(inliers: usize, total: usize, confidence: f64) -> usize {
    let w = inliers as f64 / total as f64;
    let p_good = w.powi(3);
    if p_good >= 1.0 {
        return 0;
    }
    if p_good <= 0.0 {
        return usize::MAX;
    }
    let needed = (1.0 - confidence).ln() / (1.0 - p_good).ln();
    if needed.is_finite() {
        needed.ceil() as usize
    } else {
        usize::MAX
    }
}

/// Finds the plane with the largest consensus among `candidates` (indices
/// into `points`).
///
/// Returns `Ok(None)` when fewer than three candidates exist or every sample
/// was degenerate. The winning plane is refined by a least-squares fit of
/// its inliers when that does not shrink the consensus. Cancellation is
/// checked before every sample.
pub fn segment_plane(
    points: &[Point3],
    candidates: &[usize],
    params: &RansacParams,
    rng: &mut StdRng,
    monitor: &Monitor,
) -> Result<Option<PlaneModel>> {
    let n = candidates.len();
    if n < 3 {
        return Ok(None);
    }

    let mut best: Option<(Plane, Vec<usize>)> = None;
    let mut budget = params.max_iterations;
    let mut iterations = 0;
    while iterations < budget {
        monitor.checkpoint()?;
        iterations += 1;

        let i0 = rng.gen_range(0..n);
        let mut i1 = rng.gen_range(0..n);
        while i1 == i0 {
            i1 = rng.gen_range(0..n);
        }
        let mut i2 = rng.gen_range(0..n);
        while i2 == i0 || i2 == i1 {
            i2 = rng.gen_range(0..n);
        }
        let Some(candidate) = Plane::from_points(
            points[candidates[i0]],
            points[candidates[i1]],
            points[candidates[i2]],
        ) else {
            continue;
        };

        let inliers = consensus(points, candidates, &candidate, params.distance);
        let better = best
            .as_ref()
            .map_or(true, |(_, current)| inliers.len() > current.len());
        if better {
            let needed = required_iterations(inliers.len(), n, params.confidence);
            budget = budget.min(needed.max(iterations));
            best = Some((candidate, inliers));
        }
    }

    let Some((mut plane, mut inliers)) = best else {
        return Ok(None);
    };

    let inlier_points: Vec<Point3> = inliers.iter().map(|&i| points[i]).collect();
    if let Some(refined) = Plane::fit(&inlier_points) {
        let refined_inliers = consensus(points, candidates, &refined, params.distance);
        if refined_inliers.len() >= inliers.len() {
            plane = refined;
            inliers = refined_inliers;
        }
    }

    let mean_residual = if inliers.is_empty() {
        0.0
    } else {
        inliers.iter().map(|&i| plane.distance(points[i])).sum::<f64>() / inliers.len() as f64
    };
    Ok(Some(PlaneModel {
        plane,
        inlier_ratio: inliers.len() as f64 / n as f64,
        inliers,
        mean_residual,
        iterations,
    }))
}
