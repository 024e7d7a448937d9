//! Cross-section extraction.
//!
//! A slice of classified points is cut perpendicular to the tunnel axis,
//! projected onto the (offset, elevation) plane and reduced to an ordered
//! profile line: the side of its 2D alpha shape that faces the tunnel
//! interior.

use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

use delaunator::{triangulate, EMPTY};
use geo_types::LineString;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::classify::{ClassifiedPointSet, Label};
use crate::cloud::Axis;
use crate::config::SectionConfig;
use crate::error::{Result, ScanError};
use crate::geometry::{circumradius, distance, polygon_area, Point};
use crate::progress::Monitor;

/// Projections closer than this are treated as one point.
const DEDUP_SCALE: f64 = 1e6;

/// Where a profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provenance {
    /// Extracted from scan data.
    #[default]
    Actual,
    /// Imported design geometry.
    Design,
}

/// Vertex of a cross-section profile; `point.x` is the offset across the
/// tunnel and `point.y` the elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileVertex {
    pub point: Point,
    pub label: Label,
}

/// Ordered polyline of (offset, elevation) vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub provenance: Provenance,
    pub vertices: Vec<ProfileVertex>,
}

impl Profile {
    pub fn new(provenance: Provenance, vertices: Vec<ProfileVertex>) -> Self {
        Self { provenance, vertices }
    }

    /// Builds a profile from bare points, all labelled unclassified.
    pub fn from_points(provenance: Provenance, points: &[Point]) -> Self {
        let vertices = points
            .iter()
            .map(|&point| ProfileVertex {
                point,
                label: Label::Unclassified,
            })
            .collect();
        Self { provenance, vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn points(&self) -> Vec<Point> {
        self.vertices.iter().map(|v| v.point).collect()
    }

    /// Minimum and maximum offset.
    pub fn offset_range(&self) -> Option<(f64, f64)> {
        let first = self.vertices.first()?.point.x;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.min(v.point.x), hi.max(v.point.x))
        }))
    }

    /// Minimum and maximum elevation.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let first = self.vertices.first()?.point.y;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.min(v.point.y), hi.max(v.point.y))
        }))
    }

    /// Length of the polyline.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| distance(w[0].point, w[1].point))
            .sum()
    }

    /// Area enclosed by the profile, closing it from the last vertex back to
    /// the first.
    pub fn enclosed_area(&self) -> f64 {
        polygon_area(&self.points())
    }

    /// Whether both profiles have the same vertices within `tolerance`,
    /// labels included.
    pub fn approx_eq(&self, other: &Profile, tolerance: f64) -> bool {
        self.vertices.len() == other.vertices.len()
            && self.vertices.iter().zip(&other.vertices).all(|(a, b)| {
                a.label == b.label
                    && (a.point.x - b.point.x).abs() <= tolerance
                    && (a.point.y - b.point.y).abs() <= tolerance
            })
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::from(
            self.vertices
                .iter()
                .map(|v| (v.point.x, v.point.y))
                .collect::<Vec<_>>(),
        )
    }
}

/// Where and how to cut a cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRequest {
    /// Coordinate along `axis` at the slice centre.
    pub position: f64,
    /// Half thickness of the slice.
    pub tolerance: f64,
    pub axis: Axis,
    /// Alpha-shape parameter; triangles with circumradius above `1 / alpha`
    /// are dropped.
    pub alpha: f64,
}

impl SectionRequest {
    pub fn new(position: f64, config: &SectionConfig) -> Self {
        Self {
            position,
            tolerance: config.tolerance,
            axis: config.axis,
            alpha: config.alpha,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.position.is_finite() {
            return Err(ScanError::invalid_parameter("position", "must be a finite number"));
        }
        if !(self.tolerance >= 0.0) || !self.tolerance.is_finite() {
            return Err(ScanError::invalid_parameter("tolerance", "must be zero or positive"));
        }
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(ScanError::invalid_parameter("section alpha", "must be positive"));
        }
        Ok(())
    }
}

/// A classified point inside a slice, projected to (offset, elevation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionSample {
    pub point: Point,
    pub label: Label,
    /// Index of the source point in the classified point set.
    pub source: usize,
}

/// Result of a cross-section cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSection {
    pub position: f64,
    pub tolerance: f64,
    pub axis: Axis,
    /// Every classified point inside the slice.
    pub samples: Vec<SectionSample>,
    /// Ordered profile line of the samples, facing the tunnel interior.
    pub profile: Profile,
}

/// Cuts a cross-section through the ground and wall points of `classified`.
///
/// Fails with [`ScanError::EmptySlice`] when no classified point lies within
/// `tolerance` of `position`.
pub fn extract(classified: &ClassifiedPointSet, request: &SectionRequest, monitor: &Monitor) -> Result<CrossSection> {
    request.validate()?;
    monitor.checkpoint()?;
    let points = classified.points().points();
    let samples: Vec<SectionSample> = points
        .iter()
        .zip(classified.labels())
        .enumerate()
        .filter(|(_, (p, label))| {
            label.is_classified() && (request.axis.coordinate(**p) - request.position).abs() <= request.tolerance
        })
        .map(|(i, (p, label))| SectionSample {
            point: Point::new(request.axis.offset(*p), p.z),
            label: *label,
            source: i,
        })
        .collect();
    if samples.is_empty() {
        return Err(ScanError::EmptySlice {
            position: request.position,
            tolerance: request.tolerance,
        });
    }
    debug!("{} classified points in slice at {}", samples.len(), request.position);
    monitor.report(1, 2, "Computing section boundary");

    let mut seen = HashSet::new();
    let unique: Vec<&SectionSample> = samples
        .iter()
        .filter(|s| {
            seen.insert((
                (s.point.x * DEDUP_SCALE).round() as i64,
                (s.point.y * DEDUP_SCALE).round() as i64,
            ))
        })
        .collect();
    let coords: Vec<Point> = unique.iter().map(|s| s.point).collect();
    monitor.checkpoint()?;
    let order = interior_profile(&coords, request.alpha);
    let vertices = order
        .into_iter()
        .map(|i| ProfileVertex {
            point: unique[i].point,
            label: unique[i].label,
        })
        .collect();
    let profile = Profile::new(Provenance::Actual, vertices);
    monitor.report(2, 2, "Section extracted");
    info!(
        "Section at {}: {} samples, {} boundary vertices",
        request.position,
        samples.len(),
        profile.len()
    );
    Ok(CrossSection {
        position: request.position,
        tolerance: request.tolerance,
        axis: request.axis,
        samples,
        profile,
    })
}

fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 {
        e + 2
    } else {
        e - 1
    }
}

fn by_offset(points: &[Point]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order
}

/// Edge `a-b` is Gabriel with respect to `p` when `p` sees it at an acute
/// angle, i.e. lies outside the circle with diameter `a-b`.
fn sees_acute(a: Point, b: Point, p: Point) -> bool {
    (a.x - p.x) * (b.x - p.x) + (a.y - p.y) * (b.y - p.y) > 0.0
}

/// Counter-clockwise angle from direction `from` to direction `to`, in
/// `(0, 2pi]`.
fn ccw_turn(from: f64, to: f64) -> f64 {
    let mut d = (to - from).rem_euclid(2.0 * PI);
    if d <= 1e-12 {
        d = 2.0 * PI;
    }
    d
}

/// Alpha shape of a point set: its boundary edges as an adjacency list and
/// the triangles that make it up.
struct AlphaShape {
    adjacency: Vec<Vec<usize>>,
    /// Whether a point is a corner of some kept triangle.
    in_kept: Vec<bool>,
    triangles: Vec<[usize; 3]>,
}

impl AlphaShape {
    fn edges(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, ns)| ns.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect()
    }

    fn contains(&self, points: &[Point], p: Point) -> bool {
        self.triangles.iter().any(|t| {
            let o = [
                orient(points[t[0]], points[t[1]], p),
                orient(points[t[1]], points[t[2]], p),
                orient(points[t[2]], points[t[0]], p),
            ];
            o.iter().all(|&v| v >= 0.0) || o.iter().all(|&v| v <= 0.0)
        })
    }
}

/// Twice the signed area of `a`, `b`, `c`; positive when counter-clockwise.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Builds the alpha shape of `points`.
///
/// Returns `None` when the points have no triangulation (fewer than three
/// points or all collinear).
fn alpha_shape(points: &[Point], alpha: f64) -> Option<AlphaShape> {
    let coords: Vec<delaunator::Point> = points.iter().map(|p| delaunator::Point { x: p.x, y: p.y }).collect();
    let tri = triangulate(&coords);
    if tri.triangles.is_empty() {
        return None;
    }
    let radius = 1.0 / alpha;
    let kept: Vec<bool> = tri
        .triangles
        .chunks(3)
        .map(|t| circumradius(points[t[0]], points[t[1]], points[t[2]]) <= radius)
        .collect();

    let mut adjacency = vec![Vec::new(); points.len()];
    let mut in_kept = vec![false; points.len()];
    let mut triangles = Vec::new();
    for (t, keep) in kept.iter().enumerate() {
        if *keep {
            let corners = [tri.triangles[3 * t], tri.triangles[3 * t + 1], tri.triangles[3 * t + 2]];
            for &c in &corners {
                in_kept[c] = true;
            }
            triangles.push(corners);
        }
    }
    for e in 0..tri.triangles.len() {
        let twin = tri.halfedges[e];
        if twin != EMPTY && twin < e {
            continue;
        }
        let a = tri.triangles[e];
        let b = tri.triangles[next_halfedge(e)];
        let here = kept[e / 3];
        let there = twin != EMPTY && kept[twin / 3];
        let boundary = if here != there {
            true
        } else if !here && !there {
            let (pa, pb) = (points[a], points[b]);
            let mut gabriel = distance(pa, pb) <= 2.0 * radius
                && sees_acute(pa, pb, points[tri.triangles[prev_halfedge(e)]]);
            if twin != EMPTY {
                gabriel = gabriel && sees_acute(pa, pb, points[tri.triangles[prev_halfedge(twin)]]);
            }
            gabriel
        } else {
            false
        };
        if boundary {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    Some(AlphaShape {
        adjacency,
        in_kept,
        triangles,
    })
}

/// Walks the outer face of one component starting at `start`, returning
/// vertices in first-visit order.
fn walk_outer_face(points: &[Point], adjacency: &[Vec<usize>], start: usize, edge_count: usize) -> Vec<usize> {
    let mut order = vec![start];
    let mut visited = HashSet::from([start]);
    if adjacency[start].is_empty() {
        return order;
    }
    let angle = |from: usize, to: usize| (points[to].y - points[from].y).atan2(points[to].x - points[from].x);
    let pick = |at: usize, back: f64| -> usize {
        let mut best = adjacency[at][0];
        let mut best_turn = f64::INFINITY;
        for &n in &adjacency[at] {
            let turn = ccw_turn(back, angle(at, n));
            if turn < best_turn {
                best_turn = turn;
                best = n;
            }
        }
        best
    };

    // Arrive at the westernmost vertex from the west.
    let first = pick(start, PI);
    let mut from = start;
    let mut to = first;
    for _ in 0..(4 * edge_count + 4) {
        if visited.insert(to) {
            order.push(to);
        }
        let next = pick(to, angle(to, from));
        from = to;
        to = next;
        if from == start && to == first {
            break;
        }
    }
    order
}

/// Orders the boundary of the alpha shape of `points`.
///
/// Triangles of the Delaunay triangulation with circumradius at most
/// `1 / alpha` form the shape. Its boundary consists of edges used by
/// exactly one kept triangle, plus Gabriel edges no longer than `2 / alpha`
/// that belong to no kept triangle (thin point chains). Each connected
/// component is traced along its outer face from its westernmost vertex;
/// components are concatenated by increasing offset. Points with no
/// triangulation at all are ordered by offset.
///
/// Returns indices into `points`.
pub fn alpha_boundary(points: &[Point], alpha: f64) -> Vec<usize> {
    match alpha_shape(points, alpha) {
        Some(shape) => trace_components(points, &shape),
        None => by_offset(points),
    }
}

fn trace_components(points: &[Point], shape: &AlphaShape) -> Vec<usize> {
    let adjacency = &shape.adjacency;
    let edge_count = adjacency.iter().map(Vec::len).sum::<usize>() / 2;

    let mut component = vec![usize::MAX; points.len()];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for seed in 0..points.len() {
        if component[seed] != usize::MAX {
            continue;
        }
        // Interior points of the shape are not part of its boundary.
        if adjacency[seed].is_empty() && shape.in_kept[seed] {
            continue;
        }
        let id = components.len();
        let mut members = vec![seed];
        component[seed] = id;
        let mut stack = vec![seed];
        while let Some(v) = stack.pop() {
            for &n in &adjacency[v] {
                if component[n] == usize::MAX {
                    component[n] = id;
                    members.push(n);
                    stack.push(n);
                }
            }
        }
        components.push(members);
    }

    let mut traced: Vec<(f64, Vec<usize>)> = components
        .iter()
        .map(|members| {
            let start = members
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    points[a]
                        .x
                        .total_cmp(&points[b].x)
                        .then(points[b].y.total_cmp(&points[a].y))
                })
                .unwrap_or(members[0]);
            (points[start].x, walk_outer_face(points, adjacency, start, edge_count))
        })
        .collect();
    traced.sort_by(|a, b| a.0.total_cmp(&b.0));

    let order: Vec<usize> = traced.into_iter().flat_map(|(_, o)| o).collect();
    if order.is_empty() {
        by_offset(points)
    } else {
        order
    }
}

/// Whether edge `a-b` hides `v` from `eye`: the edge meets the sight line
/// strictly between the two.
fn blocks_sight(eye: Point, v: Point, a: Point, b: Point) -> bool {
    orient(eye, v, a) * orient(eye, v, b) <= 0.0 && orient(a, b, eye) * orient(a, b, v) < 0.0
}

/// Point the profile is seen from: the centre of the boundary's bounding
/// box, or a point above the shape when that centre lies inside it.
fn viewpoint(points: &[Point], boundary: &[usize], shape: &AlphaShape) -> Point {
    let (mut lo, mut hi) = (points[boundary[0]], points[boundary[0]]);
    for &i in boundary {
        let p = points[i];
        lo = Point::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    let centre = Point::new((lo.x + hi.x) / 2.0, (lo.y + hi.y) / 2.0);
    if shape.contains(points, centre) {
        Point::new(centre.x, hi.y + (hi.x - lo.x).max(hi.y - lo.y))
    } else {
        centre
    }
}

/// Ordered profile line through `points`.
///
/// Scan slices have some thickness, so the alpha-shape boundary of a tunnel
/// section is a thin band traced on both sides. The profile keeps the
/// boundary vertices visible from the centre of the section, that is the
/// surface facing the tunnel interior, and orders them counter-clockwise
/// around that centre starting after the widest angular gap. An open U
/// section therefore runs from the top of the left wall, across the floor,
/// to the top of the right wall. When the centre falls inside the shape, as
/// for a solid blob or a flat strip, the profile is its upper side seen from
/// above. Points with no triangulation are ordered by offset.
///
/// Returns indices into `points`.
pub fn interior_profile(points: &[Point], alpha: f64) -> Vec<usize> {
    let Some(shape) = alpha_shape(points, alpha) else {
        return by_offset(points);
    };
    let boundary = trace_components(points, &shape);
    if boundary.len() < 2 {
        return boundary;
    }
    let eye = viewpoint(points, &boundary, &shape);
    let edges = shape.edges();
    let mut seen: Vec<(f64, f64, usize)> = boundary
        .iter()
        .copied()
        .filter(|&v| {
            !edges
                .iter()
                .any(|&(a, b)| a != v && b != v && blocks_sight(eye, points[v], points[a], points[b]))
        })
        .map(|v| {
            let p = points[v];
            ((p.y - eye.y).atan2(p.x - eye.x), distance(eye, p), v)
        })
        .collect();
    if seen.is_empty() {
        return boundary;
    }
    seen.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let n = seen.len();
    let mut start = 0;
    let mut widest = f64::NEG_INFINITY;
    for k in 0..n {
        let next = (k + 1) % n;
        let gap = if next == 0 {
            seen[0].0 + 2.0 * PI - seen[k].0
        } else {
            seen[next].0 - seen[k].0
        };
        if gap > widest {
            widest = gap;
            start = next;
        }
    }
    (0..n).map(|k| seen[(start + k) % n].2).collect()
}

/// Groups the slice samples by label: ground first, then walls by number.
pub fn samples_by_label(section: &CrossSection) -> BTreeMap<Label, Vec<Point>> {
    let mut groups: BTreeMap<Label, Vec<Point>> = BTreeMap::new();
    for s in &section.samples {
        groups.entry(s.label).or_default().push(s.point);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::PointSet;
    use crate::geometry::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    /// U-shaped tunnel: floor at z = 0 for x in [-5, 5], walls at x = +-5
    /// up to z = 3, repeated every 0.5 m along y.
    fn tunnel() -> ClassifiedPointSet {
        let mut pts = Vec::new();
        let mut labels = Vec::new();
        for j in 0..=10 {
            let y = j as f64 * 0.5;
            for i in 0..=20 {
                pts.push(Point3::new(-5.0 + i as f64 * 0.5, y, 0.0));
                labels.push(Label::Ground);
            }
            for k in 1..=6 {
                pts.push(Point3::new(-5.0, y, k as f64 * 0.5));
                labels.push(Label::Wall(1));
                pts.push(Point3::new(5.0, y, k as f64 * 0.5));
                labels.push(Label::Wall(2));
            }
            // Unclassified clutter hanging from the roof.
            pts.push(Point3::new(0.0, y, 4.0));
            labels.push(Label::Unclassified);
        }
        ClassifiedPointSet::from_labels(Arc::new(PointSet::new(pts)), labels).unwrap()
    }

    fn request(position: f64, tolerance: f64) -> SectionRequest {
        SectionRequest {
            position,
            tolerance,
            axis: Axis::Y,
            alpha: 0.5,
        }
    }

    #[test]
    fn open_profile_walks_left_wall_floor_right_wall() {
        let section = extract(&tunnel(), &request(2.5, 0.1), &Monitor::new()).unwrap();
        assert_eq!(section.samples.len(), 21 + 12);
        assert!(section.samples.iter().all(|s| s.label.is_classified()));

        let pts = section.profile.points();
        assert_eq!(pts.len(), 33);
        assert_eq!(pts[0], Point::new(-5.0, 3.0));
        assert_eq!(pts[6], Point::new(-5.0, 0.0));
        assert_eq!(pts[26], Point::new(5.0, 0.0));
        assert_eq!(pts[32], Point::new(5.0, 3.0));
        assert_eq!(section.profile.vertices[0].label, Label::Wall(1));
        assert_eq!(section.profile.vertices[10].label, Label::Ground);
    }

    #[test]
    fn empty_slice_outside_scan() {
        let err = extract(&tunnel(), &request(1000.0, 0.5), &Monitor::new()).unwrap_err();
        assert!(matches!(err, ScanError::EmptySlice { position, .. } if position == 1000.0));
    }

    #[test]
    fn zero_tolerance_between_rows_is_empty() {
        let err = extract(&tunnel(), &request(0.25, 0.0), &Monitor::new()).unwrap_err();
        assert!(matches!(err, ScanError::EmptySlice { .. }));
        assert!(extract(&tunnel(), &request(0.5, 0.0), &Monitor::new()).is_ok());
    }

    #[test]
    fn thick_slice_deduplicates_projections() {
        let section = extract(&tunnel(), &request(2.5, 1.0), &Monitor::new()).unwrap();
        assert_eq!(section.samples.len(), 5 * 33);
        assert_eq!(section.profile.len(), 33);
    }

    /// The same U tunnel at 0.25 m spacing with up to 2 cm of sensor noise
    /// on every coordinate.
    fn noisy_tunnel() -> ClassifiedPointSet {
        let mut rng = StdRng::seed_from_u64(7);
        let mut jitter = |p: Point3| {
            Point3::new(
                p.x + rng.gen_range(-0.02..0.02),
                p.y + rng.gen_range(-0.02..0.02),
                p.z + rng.gen_range(-0.02..0.02),
            )
        };
        let mut pts = Vec::new();
        let mut labels = Vec::new();
        for j in 0..=20 {
            let y = j as f64 * 0.25;
            for i in 0..=40 {
                pts.push(jitter(Point3::new(-5.0 + i as f64 * 0.25, y, 0.0)));
                labels.push(Label::Ground);
            }
            for k in 1..=12 {
                pts.push(jitter(Point3::new(-5.0, y, k as f64 * 0.25)));
                labels.push(Label::Wall(1));
                pts.push(jitter(Point3::new(5.0, y, k as f64 * 0.25)));
                labels.push(Label::Wall(2));
            }
        }
        ClassifiedPointSet::from_labels(Arc::new(PointSet::new(pts)), labels).unwrap()
    }

    #[test]
    fn noisy_slice_gives_single_interior_line() {
        let section = extract(&noisy_tunnel(), &request(2.5, 0.5), &Monitor::new()).unwrap();
        let profile = &section.profile;
        assert!(profile.len() < section.samples.len());

        let first = profile.vertices.first().unwrap().point;
        let last = profile.vertices.last().unwrap().point;
        assert!(first.x < -4.9 && first.y > 2.7, "first vertex {first:?}");
        assert!(last.x > 4.9 && last.y > 2.7, "last vertex {last:?}");

        let mut runs: Vec<Label> = profile.vertices.iter().map(|v| v.label).collect();
        runs.dedup();
        assert_eq!(runs, vec![Label::Wall(1), Label::Ground, Label::Wall(2)]);

        // Inner faces sit at most 2 cm inside the 10 m x 3 m design box.
        let area = profile.enclosed_area();
        assert!((28.5..=30.5).contains(&area), "area {area}");
    }

    #[test]
    fn solid_shape_keeps_upper_side() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert_eq!(interior_profile(&pts, 0.5), vec![3, 2]);
    }

    #[test]
    fn closed_square_is_traced_once() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let order = alpha_boundary(&pts, 0.5);
        assert_eq!(order, vec![3, 0, 1, 2]);
    }

    #[test]
    fn collinear_points_are_sorted_by_offset() {
        let pts = vec![Point::new(2.0, 0.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert_eq!(alpha_boundary(&pts, 0.5), vec![1, 2, 0]);
    }

    #[test]
    fn separate_clusters_are_concatenated_by_offset() {
        let pts = vec![
            Point::new(10.0, 0.0),
            Point::new(11.0, 0.0),
            Point::new(10.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        let order = alpha_boundary(&pts, 0.5);
        assert_eq!(order.len(), 6);
        assert_eq!(order[0], 5);
        assert!(order[..3].iter().all(|&i| i >= 3));
    }

    #[test]
    fn profile_measures() {
        let profile = Profile::from_points(
            Provenance::Design,
            &[Point::new(0.0, 1.0), Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(2.0, 1.0)],
        );
        assert_eq!(profile.offset_range(), Some((0.0, 2.0)));
        assert_eq!(profile.elevation_range(), Some((0.0, 1.0)));
        assert!((profile.length() - 4.0).abs() < 1e-12);
        assert!((profile.enclosed_area() - 2.0).abs() < 1e-12);
        assert_eq!(profile.to_line_string().0.len(), 4);
    }
}
