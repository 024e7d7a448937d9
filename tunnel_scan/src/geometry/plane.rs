//! Infinite planes in 3D used by plane segmentation and surface meshing.

use nalgebra::{Matrix3, SymmetricEigen};

use super::{cross, dot, norm, normalize, subtract, Point, Point3};

/// Plane `normal . p + offset = 0` with a unit normal.
///
/// Normals are kept in a canonical orientation (positive `z`, then positive
/// `x`, then positive `y`) so the same surface always reports the same
/// coefficients.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    pub normal: Point3,
    pub offset: f64,
}

impl Plane {
    /// Creates a plane from a (not necessarily unit) normal and a point on it.
    pub fn from_normal_and_point(normal: Point3, point: Point3) -> Option<Self> {
        if norm(normal) <= f64::EPSILON {
            return None;
        }
        let n = canonical(normalize(normal));
        Some(Self {
            normal: n,
            offset: -dot(n, point),
        })
    }

    /// Plane through three points, `None` when they are (nearly) collinear.
    pub fn from_points(a: Point3, b: Point3, c: Point3) -> Option<Self> {
        let n = cross(subtract(b, a), subtract(c, a));
        if norm(n) <= 1e-12 {
            return None;
        }
        Self::from_normal_and_point(n, a)
    }

    /// Least-squares plane through `points` (smallest eigenvector of the
    /// covariance). Needs at least three non-collinear points.
    pub fn fit(points: &[Point3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let centroid = centroid(points);
        let mut cov = Matrix3::<f64>::zeros();
        for p in points {
            let d = [p.x - centroid.x, p.y - centroid.y, p.z - centroid.z];
            for r in 0..3 {
                for c in 0..3 {
                    cov[(r, c)] += d[r] * d[c];
                }
            }
        }
        let eigen = SymmetricEigen::new(cov);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        // The two largest eigenvalues must span a plane.
        if eigen.eigenvalues[order[1]].abs() <= 1e-12 {
            return None;
        }
        let v = eigen.eigenvectors.column(order[0]);
        Self::from_normal_and_point(Point3::new(v[0], v[1], v[2]), centroid)
    }

    /// Signed distance of `p` from the plane.
    pub fn signed_distance(&self, p: Point3) -> f64 {
        dot(self.normal, p) + self.offset
    }

    /// Absolute distance of `p` from the plane.
    pub fn distance(&self, p: Point3) -> f64 {
        self.signed_distance(p).abs()
    }

    /// Angle in degrees between the plane normal and the vertical axis.
    /// Horizontal planes report 0, vertical planes 90.
    pub fn normal_angle_from_vertical(&self) -> f64 {
        self.normal.z.abs().clamp(0.0, 1.0).acos().to_degrees()
    }

    /// Angle in degrees between the plane normal and the horizontal plane.
    /// Vertical planes report 0, horizontal planes 90.
    pub fn normal_angle_from_horizontal(&self) -> f64 {
        90.0 - self.normal_angle_from_vertical()
    }

    /// Orthonormal in-plane frame `(origin, u, v)` anchored at the projection
    /// of `anchor`. For non-horizontal planes `v` points as far up as the
    /// plane allows.
    pub fn frame(&self, anchor: Point3) -> PlaneFrame {
        let origin = subtract(
            anchor,
            Point3::new(
                self.normal.x * self.signed_distance(anchor),
                self.normal.y * self.signed_distance(anchor),
                self.normal.z * self.signed_distance(anchor),
            ),
        );
        let up = Point3::new(0.0, 0.0, 1.0);
        let u = if norm(cross(self.normal, up)) > 1e-9 {
            normalize(cross(up, self.normal))
        } else {
            Point3::new(1.0, 0.0, 0.0)
        };
        let v = normalize(cross(self.normal, u));
        PlaneFrame { origin, u, v }
    }
}

/// Local 2D coordinate system lying in a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    pub origin: Point3,
    pub u: Point3,
    pub v: Point3,
}

impl PlaneFrame {
    /// Projects a world point into frame coordinates.
    pub fn project(&self, p: Point3) -> Point {
        let d = subtract(p, self.origin);
        Point::new(dot(d, self.u), dot(d, self.v))
    }
}

/// Arithmetic mean of `points`; the origin for an empty slice.
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::new(0.0, 0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy, sz) = points
        .iter()
        .fold((0.0, 0.0, 0.0), |(x, y, z), p| (x + p.x, y + p.y, z + p.z));
    Point3::new(sx / n, sy / n, sz / n)
}

fn canonical(n: Point3) -> Point3 {
    const EPS: f64 = 1e-12;
    let flip = if n.z.abs() > EPS {
        n.z < 0.0
    } else if n.x.abs() > EPS {
        n.x < 0.0
    } else {
        n.y < 0.0
    };
    if flip {
        Point3::new(-n.x, -n.y, -n.z)
    } else {
        n
    }
}
