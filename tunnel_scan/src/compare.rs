//! Comparison of an extracted profile against a design profile.

use log::{debug, info};
use serde::Serialize;

use crate::classify::Label;
use crate::config::{CompareConfig, MatchRule};
use crate::error::{Result, ScanError};
use crate::geometry::{distance, polygon_area, Point};
use crate::section::Profile;

const EPS: f64 = 1e-9;

/// Deviation of one actual vertex from the design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
    pub offset: f64,
    pub elevation: f64,
    pub design_elevation: f64,
    /// `elevation - design_elevation`; positive means above design.
    pub deviation: f64,
    pub label: Label,
}

/// Aggregate deviation figures.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviationStats {
    pub matched: usize,
    /// Actual vertices outside the design offset range.
    pub unmatched: usize,
    pub max_deviation: f64,
    pub min_deviation: f64,
    pub mean_deviation: f64,
    pub mean_absolute_deviation: f64,
    pub max_absolute_deviation: f64,
    pub rms_deviation: f64,
    pub actual_area: f64,
    pub design_area: f64,
    /// `actual_area - design_area`.
    pub area_difference: f64,
}

/// Per-vertex deviations and their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub rule: MatchRule,
    pub deviations: Vec<Deviation>,
    pub stats: DeviationStats,
}

impl ComparisonResult {
    /// Deviations whose magnitude exceeds `limit`.
    pub fn exceeding(&self, limit: f64) -> impl Iterator<Item = &Deviation> {
        self.deviations.iter().filter(move |d| d.deviation.abs() > limit)
    }
}

/// Point of segment `a-b` closest to `p`.
fn closest_on_segment(a: Point, b: Point, p: Point) -> Point {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= EPS * EPS {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

/// Design elevation for the actual vertex `(x, z)`.
///
/// Every design segment spanning `x` is a candidate; steep segments (walls)
/// span `x` when it lies within `band` of their offset range. The candidate
/// nearest to the vertex wins. A steep segment yields the elevation of its
/// point closest to the vertex, any other segment is interpolated at `x`.
fn interpolate(design: &[Point], x: f64, z: f64, band: f64) -> Option<f64> {
    let p = Point::new(x, z);
    let mut best: Option<(f64, f64)> = None;
    for w in design.windows(2) {
        let (a, b) = (w[0], w[1]);
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let steep = dx.abs() <= dy.abs();
        let pad = if steep { band } else { EPS };
        if x < a.x.min(b.x) - pad || x > a.x.max(b.x) + pad {
            continue;
        }
        let closest = closest_on_segment(a, b, p);
        let elevation = if steep {
            closest.y
        } else {
            let t = ((x - a.x) / dx).clamp(0.0, 1.0);
            a.y + t * dy
        };
        let gap = distance(closest, p);
        if best.map_or(true, |(nearest, _)| gap < nearest) {
            best = Some((gap, elevation));
        }
    }
    best.map(|(_, elevation)| elevation)
}

fn nearest_vertex(design: &[Point], x: f64, z: f64) -> Option<f64> {
    design
        .iter()
        .min_by(|a, b| {
            (a.x - x)
                .abs()
                .total_cmp(&(b.x - x).abs())
                .then((a.y - z).abs().total_cmp(&(b.y - z).abs()))
        })
        .map(|p| p.y)
}

/// Compares `actual` against `design`.
///
/// Only actual vertices whose offset lies within the design offset range,
/// widened by `config.range_margin` and `config.offset_band`, are matched.
/// Fails with [`ScanError::ProfileMismatch`] when none does.
pub fn compare(actual: &Profile, design: &Profile, config: &CompareConfig) -> Result<ComparisonResult> {
    config.validate()?;
    let design_points = design.points();
    let (Some((dmin, dmax)), Some((amin, amax))) = (design.offset_range(), actual.offset_range()) else {
        return Err(ScanError::invalid_parameter("profile", "profiles must not be empty"));
    };
    if design_points.len() < 2 {
        return Err(ScanError::invalid_parameter("design", "at least two points are required"));
    }
    let lo = dmin - config.range_margin - config.offset_band;
    let hi = dmax + config.range_margin + config.offset_band;

    let mut deviations = Vec::new();
    let mut unmatched = 0;
    for v in &actual.vertices {
        let (x, z) = (v.point.x, v.point.y);
        if x < lo || x > hi {
            unmatched += 1;
            continue;
        }
        let design_z = match config.rule {
            MatchRule::Interpolate => interpolate(&design_points, x.clamp(dmin, dmax), z, config.offset_band),
            MatchRule::NearestVertex => nearest_vertex(&design_points, x, z),
        };
        let Some(design_z) = design_z else {
            unmatched += 1;
            continue;
        };
        deviations.push(Deviation {
            offset: x,
            elevation: z,
            design_elevation: design_z,
            deviation: z - design_z,
            label: v.label,
        });
    }
    if deviations.is_empty() {
        return Err(ScanError::ProfileMismatch {
            actual_min: amin,
            actual_max: amax,
            design_min: dmin,
            design_max: dmax,
        });
    }
    debug!("{} vertices matched, {} outside the design range", deviations.len(), unmatched);

    let n = deviations.len() as f64;
    let values: Vec<f64> = deviations.iter().map(|d| d.deviation).collect();
    let actual_area = polygon_area(&actual.points());
    let design_area = polygon_area(&design_points);
    let stats = DeviationStats {
        matched: deviations.len(),
        unmatched,
        max_deviation: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_deviation: values.iter().copied().fold(f64::INFINITY, f64::min),
        mean_deviation: values.iter().sum::<f64>() / n,
        mean_absolute_deviation: values.iter().map(|v| v.abs()).sum::<f64>() / n,
        max_absolute_deviation: values.iter().map(|v| v.abs()).fold(0.0, f64::max),
        rms_deviation: (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt(),
        actual_area,
        design_area,
        area_difference: actual_area - design_area,
    };
    info!(
        "Compared {} vertices: max |dev| {:.3}, mean {:.3}",
        stats.matched, stats.max_absolute_deviation, stats.mean_deviation
    );
    Ok(ComparisonResult {
        rule: config.rule,
        deviations,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Provenance;
    use approx::assert_relative_eq;

    fn profile(provenance: Provenance, pts: &[(f64, f64)]) -> Profile {
        let pts: Vec<Point> = pts.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Profile::from_points(provenance, &pts)
    }

    fn design() -> Profile {
        profile(
            Provenance::Design,
            &[(-5.0, 3.0), (-5.0, 0.0), (5.0, 0.0), (5.0, 3.0)],
        )
    }

    #[test]
    fn identical_profiles_have_zero_deviation() {
        let d = design();
        let actual = Profile {
            provenance: Provenance::Actual,
            ..d.clone()
        };
        let result = compare(&actual, &d, &CompareConfig::default()).unwrap();
        assert_eq!(result.stats.matched, 4);
        assert_eq!(result.stats.max_absolute_deviation, 0.0);
        assert_eq!(result.stats.rms_deviation, 0.0);
        assert_eq!(result.stats.area_difference, 0.0);
    }

    #[test]
    fn raised_floor_shows_positive_deviation() {
        let actual = profile(
            Provenance::Actual,
            &[(-5.0, 3.0), (-5.0, 0.1), (-2.0, 0.1), (0.0, 0.1), (2.0, 0.1), (5.0, 0.1), (5.0, 3.0)],
        );
        let result = compare(&actual, &design(), &CompareConfig::default()).unwrap();
        assert_eq!(result.stats.matched, 7);
        // Wall vertices clamp onto the vertical design segments.
        assert_relative_eq!(result.deviations[0].deviation, 0.0);
        assert_relative_eq!(result.deviations[3].deviation, 0.1, epsilon = 1e-12);
        assert_relative_eq!(result.stats.max_deviation, 0.1, epsilon = 1e-12);
        assert_relative_eq!(result.stats.min_deviation, 0.0);
        assert_eq!(result.exceeding(0.05).count(), 3);
    }

    #[test]
    fn nearest_vertex_rule() {
        let actual = profile(Provenance::Actual, &[(-4.0, 0.5), (4.5, -0.2)]);
        let config = CompareConfig {
            rule: MatchRule::NearestVertex,
            ..Default::default()
        };
        let result = compare(&actual, &design(), &config).unwrap();
        assert_relative_eq!(result.deviations[0].design_elevation, 0.0);
        assert_relative_eq!(result.deviations[1].deviation, -0.2);
    }

    #[test]
    fn vertices_outside_design_range_are_unmatched() {
        let actual = profile(Provenance::Actual, &[(-7.0, 0.0), (0.0, -0.3), (7.0, 0.0)]);
        let result = compare(&actual, &design(), &CompareConfig::default()).unwrap();
        assert_eq!(result.stats.matched, 1);
        assert_eq!(result.stats.unmatched, 2);

        let widened = CompareConfig {
            range_margin: 2.0,
            ..Default::default()
        };
        let result = compare(&actual, &design(), &widened).unwrap();
        assert_eq!(result.stats.matched, 3);
    }

    #[test]
    fn wall_vertices_off_the_design_line_match_the_wall() {
        let actual = profile(
            Provenance::Actual,
            &[(-4.99, 2.0), (-5.03, 1.0), (-4.5, 0.02), (4.92, 2.5)],
        );
        let result = compare(&actual, &design(), &CompareConfig::default()).unwrap();
        assert_eq!(result.stats.matched, 4);
        assert_relative_eq!(result.deviations[0].design_elevation, 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.deviations[0].deviation, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.deviations[1].deviation, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.deviations[2].deviation, 0.02, epsilon = 1e-12);
        assert_relative_eq!(result.deviations[3].deviation, 0.0, epsilon = 1e-12);

        // Outside the band the floor is the only candidate.
        let narrow = CompareConfig {
            offset_band: 0.005,
            ..Default::default()
        };
        let result = compare(&actual, &design(), &narrow).unwrap();
        assert_eq!(result.stats.unmatched, 1);
        assert_relative_eq!(result.deviations[0].deviation, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn floor_vertex_near_a_wall_keeps_floor_deviation() {
        let actual = profile(Provenance::Actual, &[(-4.95, 0.01), (4.98, -0.03)]);
        let result = compare(&actual, &design(), &CompareConfig::default()).unwrap();
        assert_relative_eq!(result.deviations[0].deviation, 0.01, epsilon = 1e-12);
        assert_relative_eq!(result.deviations[1].deviation, -0.03, epsilon = 1e-12);
    }

    #[test]
    fn overlapping_ranges_without_matched_vertices() {
        let actual = profile(Provenance::Actual, &[(-10.0, 0.0), (10.0, 0.0)]);
        let err = compare(&actual, &design(), &CompareConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::ProfileMismatch { .. }));
        assert!(err.to_string().contains("no actual vertex lies within the design offset range"));
    }

    #[test]
    fn disjoint_profiles_mismatch() {
        let actual = profile(Provenance::Actual, &[(20.0, 0.0), (30.0, 0.0)]);
        let err = compare(&actual, &design(), &CompareConfig::default()).unwrap_err();
        match err {
            ScanError::ProfileMismatch {
                actual_min,
                design_max,
                ..
            } => {
                assert_eq!(actual_min, 20.0);
                assert_eq!(design_max, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
