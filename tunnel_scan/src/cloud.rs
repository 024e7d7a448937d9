//! In-memory point sets loaded from scan files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds3, Point3};

/// Horizontal axis running along the tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    X,
    #[default]
    Y,
}

impl Axis {
    /// Coordinate of `p` along this axis.
    pub fn coordinate(self, p: Point3) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// Horizontal coordinate across the tunnel for a point seen in a slice
    /// perpendicular to this axis.
    pub fn offset(self, p: Point3) -> f64 {
        match self {
            Axis::X => p.y,
            Axis::Y => p.x,
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            other => Err(format!("unknown axis '{other}', expected x or y")),
        }
    }
}

/// Ordered collection of scanned points with optional per-point attributes.
///
/// A point set is immutable once built; derived structures share it through
/// `Arc`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    points: Vec<Point3>,
    intensity: Option<Vec<u16>>,
    return_number: Option<Vec<u8>>,
}

impl PointSet {
    /// Builds a point set from positions only.
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            intensity: None,
            return_number: None,
        }
    }

    /// Builds a point set with attributes. Attribute vectors whose length
    /// differs from the point count are dropped.
    pub fn with_attributes(
        points: Vec<Point3>,
        intensity: Option<Vec<u16>>,
        return_number: Option<Vec<u8>>,
    ) -> Self {
        let n = points.len();
        Self {
            points,
            intensity: intensity.filter(|v| v.len() == n),
            return_number: return_number.filter(|v| v.len() == n),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    pub fn intensity(&self) -> Option<&[u16]> {
        self.intensity.as_deref()
    }

    pub fn return_number(&self) -> Option<&[u8]> {
        self.return_number.as_deref()
    }

    pub fn bounds(&self) -> Option<Bounds3> {
        Bounds3::from_points(&self.points)
    }

    /// Minimum and maximum coordinate along `axis`.
    pub fn axis_range(&self, axis: Axis) -> Option<(f64, f64)> {
        let b = self.bounds()?;
        Some((axis.coordinate(b.min), axis.coordinate(b.max)))
    }

    /// New point set holding the points at `indices`, attributes included.
    pub fn subset(&self, indices: &[usize]) -> PointSet {
        let points = indices.iter().map(|&i| self.points[i]).collect();
        let intensity = self
            .intensity
            .as_ref()
            .map(|v| indices.iter().map(|&i| v[i]).collect());
        let return_number = self
            .return_number
            .as_ref()
            .map(|v| indices.iter().map(|&i| v[i]).collect());
        PointSet {
            points,
            intensity,
            return_number,
        }
    }
}

impl From<Vec<Point3>> for PointSet {
    fn from(points: Vec<Point3>) -> Self {
        PointSet::new(points)
    }
}

/// Header metadata of a loaded scan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHeader {
    pub path: PathBuf,
    /// Number of points declared by the file header.
    pub point_count: u64,
    pub bounds: Bounds3,
    /// LAS version as `major.minor`.
    pub version: String,
    pub point_format: u8,
    pub system_identifier: String,
    pub generating_software: String,
    pub crs: CrsHint,
}

impl ScanHeader {
    /// File name without directories.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Coordinate reference information found in the file's variable length
/// records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CrsHint {
    /// No projection records present.
    #[default]
    None,
    /// OGC WKT definition.
    Wkt(String),
    /// GeoTIFF key directory present (keys are not decoded).
    GeoTiffKeys,
}
