//! Ground and wall classification by iterative plane segmentation.
//!
//! Planes are extracted one at a time with RANSAC. Each plane is tested
//! against the ground and wall criteria, and its inliers are removed from
//! the pool whether or not it is accepted. Extraction stops when the plane
//! budget is spent or the next plane is too small.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cloud::PointSet;
use crate::config::ClassifierConfig;
use crate::error::{Result, ScanError};
use crate::geometry::{Plane, Point3};
use crate::progress::Monitor;
use crate::ransac::{segment_plane, RansacParams};

static WALL_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)wall[-_ ]?(\d+)$").unwrap());

/// Surface class of a scanned point.
///
/// Walls are numbered from 1 in descending order of their point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Ground,
    Wall(usize),
    Unclassified,
}

impl Label {
    pub fn is_wall(self) -> bool {
        matches!(self, Label::Wall(_))
    }

    /// Ground or wall.
    pub fn is_classified(self) -> bool {
        !matches!(self, Label::Unclassified)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ground => write!(f, "Ground"),
            Label::Wall(n) => write!(f, "Wall{n}"),
            Label::Unclassified => write!(f, "Unclassified"),
        }
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ground") {
            return Ok(Label::Ground);
        }
        if s.eq_ignore_ascii_case("unclassified") || s.is_empty() {
            return Ok(Label::Unclassified);
        }
        if let Some(caps) = WALL_LABEL.captures(s) {
            let n: usize = caps[1].parse().map_err(|_| format!("wall number out of range in '{s}'"))?;
            if n == 0 {
                return Err("wall numbers start at 1".to_string());
            }
            return Ok(Label::Wall(n));
        }
        Err(format!("unknown surface label '{s}'"))
    }
}

/// Plane accepted as ground or wall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSummary {
    pub label: Label,
    pub plane: Plane,
    pub point_count: usize,
    /// Height range (max z - min z) of the surface points.
    pub vertical_extent: f64,
    pub mean_residual: f64,
}

/// Point counts per label.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassificationStats {
    pub total_points: usize,
    pub ground_points: usize,
    /// Entry `i` counts the points of `Wall(i + 1)`.
    pub wall_points: Vec<usize>,
    pub unclassified_points: usize,
}

impl ClassificationStats {
    pub fn wall_count(&self) -> usize {
        self.wall_points.len()
    }

    /// Share of points labelled ground or wall.
    pub fn classified_ratio(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            (self.total_points - self.unclassified_points) as f64 / self.total_points as f64
        }
    }
}

/// A point set with one label per point.
#[derive(Clone, PartialEq)]
pub struct ClassifiedPointSet {
    points: Arc<PointSet>,
    labels: Vec<Label>,
    surfaces: Vec<SurfaceSummary>,
}

impl fmt::Debug for ClassifiedPointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedPointSet")
            .field("points", &self.points.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ClassifiedPointSet {
    /// Attaches existing labels to a point set. Surface planes are fitted
    /// per label by least squares.
    pub fn from_labels(points: Arc<PointSet>, labels: Vec<Label>) -> Result<Self> {
        if labels.len() != points.len() {
            return Err(ScanError::invalid_parameter(
                "labels",
                format!("{} labels for {} points", labels.len(), points.len()),
            ));
        }
        if labels.contains(&Label::Wall(0)) {
            return Err(ScanError::invalid_parameter("labels", "wall numbers start at 1"));
        }
        let mut groups: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            if label.is_classified() {
                groups.entry(*label).or_default().push(i);
            }
        }
        let surfaces = groups
            .into_iter()
            .filter_map(|(label, indices)| {
                let pts: Vec<Point3> = indices.iter().map(|&i| points.points()[i]).collect();
                let plane = Plane::fit(&pts)?;
                let mean_residual = pts.iter().map(|p| plane.distance(*p)).sum::<f64>() / pts.len() as f64;
                Some(SurfaceSummary {
                    label,
                    plane,
                    point_count: pts.len(),
                    vertical_extent: vertical_extent(&pts),
                    mean_residual,
                })
            })
            .collect();
        Ok(Self {
            points,
            labels,
            surfaces,
        })
    }

    pub fn points(&self) -> &Arc<PointSet> {
        &self.points
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<Label> {
        self.labels.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Accepted surfaces: ground planes first, then walls by number.
    pub fn surfaces(&self) -> &[SurfaceSummary] {
        &self.surfaces
    }

    pub fn wall_count(&self) -> usize {
        self.labels
            .iter()
            .filter_map(|l| match l {
                Label::Wall(n) => Some(*n),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Indices of all points carrying `label`, ascending.
    pub fn indices_of(&self, label: Label) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether this classification was computed for `points`.
    pub fn belongs_to(&self, points: &Arc<PointSet>) -> bool {
        Arc::ptr_eq(&self.points, points)
    }

    pub fn stats(&self) -> ClassificationStats {
        let mut stats = ClassificationStats {
            total_points: self.labels.len(),
            wall_points: vec![0; self.wall_count()],
            ..Default::default()
        };
        for label in &self.labels {
            match label {
                Label::Ground => stats.ground_points += 1,
                Label::Wall(n) => stats.wall_points[n - 1] += 1,
                Label::Unclassified => stats.unclassified_points += 1,
            }
        }
        stats
    }

    /// Ground and wall points as a new point set, with the original index of
    /// every kept point.
    pub fn classified_subset(&self) -> (PointSet, Vec<usize>) {
        let indices: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_classified())
            .map(|(i, _)| i)
            .collect();
        (self.points.subset(&indices), indices)
    }
}

fn vertical_extent(points: &[Point3]) -> f64 {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.z), hi.max(p.z)));
    if lo.is_finite() {
        hi - lo
    } else {
        0.0
    }
}

struct WallCandidate {
    plane: Plane,
    inliers: Vec<usize>,
    vertical_extent: f64,
    mean_residual: f64,
}

/// Labels every point of `points` as ground, wall or unclassified.
///
/// Fails with [`ScanError::InsufficientWalls`] when fewer than two walls are
/// found; the error carries the partial classification. Identical inputs and
/// configuration always give identical labels.
pub fn classify(points: Arc<PointSet>, config: &ClassifierConfig, monitor: &Monitor) -> Result<ClassifiedPointSet> {
    config.validate()?;
    let coords = points.points();
    let params = RansacParams {
        distance: config.ransac_distance,
        max_iterations: config.ransac_iterations,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut remaining: Vec<usize> = (0..coords.len()).collect();
    let mut labels = vec![Label::Unclassified; coords.len()];
    let mut ground: Vec<SurfaceSummary> = Vec::new();
    let mut walls: Vec<WallCandidate> = Vec::new();
    let total = config.max_planes as u64;

    for pass in 0..config.max_planes {
        monitor.checkpoint()?;
        monitor.report(pass as u64, total, format!("Segmenting plane {} of {}", pass + 1, total));
        if remaining.len() < config.min_plane_points {
            debug!("{} points left, below the plane minimum", remaining.len());
            break;
        }
        let Some(model) = segment_plane(coords, &remaining, &params, &mut rng, monitor)? else {
            break;
        };
        if model.inliers.len() < config.min_plane_points {
            debug!("plane with {} inliers is below the minimum", model.inliers.len());
            break;
        }

        let inlier_points: Vec<Point3> = model.inliers.iter().map(|&i| coords[i]).collect();
        let extent = vertical_extent(&inlier_points);
        let from_vertical = model.plane.normal_angle_from_vertical();
        let from_horizontal = model.plane.normal_angle_from_horizontal();
        if from_vertical <= config.ground_angle {
            info!(
                "Found ground plane: {} points, normal {:.1} deg from vertical",
                model.inliers.len(),
                from_vertical
            );
            for &i in &model.inliers {
                labels[i] = Label::Ground;
            }
            ground.push(SurfaceSummary {
                label: Label::Ground,
                plane: model.plane,
                point_count: model.inliers.len(),
                vertical_extent: extent,
                mean_residual: model.mean_residual,
            });
        } else if from_horizontal <= config.wall_angle && extent > config.min_wall_height {
            info!("Found wall plane: {} points, height {:.2} m", model.inliers.len(), extent);
            walls.push(WallCandidate {
                plane: model.plane,
                inliers: model.inliers.clone(),
                vertical_extent: extent,
                mean_residual: model.mean_residual,
            });
        } else {
            debug!(
                "Rejected plane: {} points, {:.1} deg from vertical, height {:.2} m",
                model.inliers.len(),
                from_vertical,
                extent
            );
        }

        // Inliers leave the pool whether the plane was accepted or not.
        let mut taken = model.inliers;
        taken.sort_unstable();
        remaining.retain(|i| taken.binary_search(i).is_err());
    }

    walls.sort_by(|a, b| {
        b.inliers
            .len()
            .cmp(&a.inliers.len())
            .then_with(|| a.inliers.first().cmp(&b.inliers.first()))
    });
    let mut surfaces = ground;
    for (rank, wall) in walls.iter().enumerate() {
        let label = Label::Wall(rank + 1);
        for &i in &wall.inliers {
            labels[i] = label;
        }
        surfaces.push(SurfaceSummary {
            label,
            plane: wall.plane,
            point_count: wall.inliers.len(),
            vertical_extent: wall.vertical_extent,
            mean_residual: wall.mean_residual,
        });
    }
    monitor.report(total, total, "Classification complete");

    let result = ClassifiedPointSet {
        points,
        labels,
        surfaces,
    };
    if walls.len() < 2 {
        warn!("Only {} wall(s) found", walls.len());
        return Err(ScanError::InsufficientWalls {
            found: walls.len(),
            partial: Box::new(result),
        });
    }
    Ok(result)
}
