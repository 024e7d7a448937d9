//! Basic geometry primitives for point cloud and profile operations.

pub mod plane;
pub use plane::Plane;

/// Point in a plane.
///
/// In cross-section space `x` is the offset across the tunnel and `y` the
/// elevation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Scan coordinate in metres.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned bounding box of a set of 3D points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    /// Computes the bounds of `points`, or `None` when the slice is empty.
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = *points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some(Self { min, max })
    }

    /// Returns the extent along each axis.
    pub fn size(&self) -> Point3 {
        subtract(self.max, self.min)
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Shoelace area of the polygon closed by joining the last vertex back to
/// the first. Orientation is ignored.
pub fn polygon_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() / 2.0
}

/// Radius of the circle through three points, `f64::INFINITY` when they are
/// collinear.
pub fn circumradius(a: Point, b: Point, c: Point) -> f64 {
    let ab = distance(a, b);
    let bc = distance(b, c);
    let ca = distance(c, a);
    let cross2 = ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs();
    if cross2 <= f64::EPSILON {
        return f64::INFINITY;
    }
    ab * bc * ca / (2.0 * cross2)
}

pub(crate) fn subtract(a: Point3, b: Point3) -> Point3 {
    Point3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

pub(crate) fn cross(a: Point3, b: Point3) -> Point3 {
    Point3::new(a.y * b.z - a.z * b.y, a.z * b.x - a.x * b.z, a.x * b.y - a.y * b.x)
}

pub(crate) fn dot(a: Point3, b: Point3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub(crate) fn norm(v: Point3) -> f64 {
    dot(v, v).sqrt()
}

pub(crate) fn normalize(v: Point3) -> Point3 {
    let len = norm(v);
    if len == 0.0 {
        Point3::new(0.0, 0.0, 0.0)
    } else {
        Point3::new(v.x / len, v.y / len, v.z / len)
    }
}
