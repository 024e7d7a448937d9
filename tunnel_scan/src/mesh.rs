//! Surface mesh reconstruction from classified points.
//!
//! Each surface (ground and every wall) is downsampled on a voxel grid,
//! projected into its best-fit plane and triangulated there. Triangles
//! larger than the alpha radius are dropped so gaps in the scan stay open.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use log::{debug, info, warn};
use serde::Serialize;

use crate::classify::{ClassifiedPointSet, Label};
use crate::config::MeshConfig;
use crate::error::{Result, ScanError};
use crate::geometry::{circumradius, cross, norm, plane::centroid, subtract, Bounds3, Plane, Point3};
use crate::io::write_string;
use crate::progress::Monitor;

/// Triangle mesh with shared vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    /// Vertex indices of each triangle.
    pub faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds3> {
        Bounds3::from_points(&self.vertices)
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let a = self.vertices[f[0]];
                let ab = subtract(self.vertices[f[1]], a);
                let ac = subtract(self.vertices[f[2]], a);
                norm(cross(ab, ac)) * 0.5
            })
            .sum()
    }

    fn append(&mut self, other: Mesh) {
        let base = self.vertices.len();
        self.vertices.extend(other.vertices);
        self.faces
            .extend(other.faces.into_iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
    }
}

/// Replaces the points inside each cubic voxel of edge `voxel_size` by
/// their centroid. A size of zero returns the points unchanged.
pub fn voxel_downsample(points: &[Point3], voxel_size: f64) -> Vec<Point3> {
    if voxel_size <= 0.0 {
        return points.to_vec();
    }
    let mut cells: BTreeMap<(i64, i64, i64), (Point3, usize)> = BTreeMap::new();
    for p in points {
        let key = (
            (p.x / voxel_size).floor() as i64,
            (p.y / voxel_size).floor() as i64,
            (p.z / voxel_size).floor() as i64,
        );
        let entry = cells.entry(key).or_insert((Point3::new(0.0, 0.0, 0.0), 0));
        entry.0.x += p.x;
        entry.0.y += p.y;
        entry.0.z += p.z;
        entry.1 += 1;
    }
    cells
        .into_values()
        .map(|(sum, n)| {
            let n = n as f64;
            Point3::new(sum.x / n, sum.y / n, sum.z / n)
        })
        .collect()
}

/// Triangulates one planar surface; `None` when no triangle survives.
fn surface_mesh(points: &[Point3], alpha: f64) -> Option<Mesh> {
    if points.len() < 3 {
        return None;
    }
    let plane = Plane::fit(points)?;
    let frame = plane.frame(centroid(points));
    let projected: Vec<_> = points.iter().map(|p| frame.project(*p)).collect();
    let coords: Vec<delaunator::Point> = projected
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let tri = delaunator::triangulate(&coords);

    let mut remap = vec![usize::MAX; points.len()];
    let mut mesh = Mesh::default();
    for t in tri.triangles.chunks(3) {
        if circumradius(projected[t[0]], projected[t[1]], projected[t[2]]) > alpha {
            continue;
        }
        let mut face = [0; 3];
        for (k, &i) in t.iter().enumerate() {
            if remap[i] == usize::MAX {
                remap[i] = mesh.vertices.len();
                mesh.vertices.push(points[i]);
            }
            face[k] = remap[i];
        }
        mesh.faces.push(face);
    }
    (!mesh.is_empty()).then_some(mesh)
}

/// Builds a triangle mesh of the ground and wall surfaces.
///
/// Fails with [`ScanError::Reconstruction`] when there are no classified
/// points or no triangle fits within the alpha radius.
pub fn reconstruct(classified: &ClassifiedPointSet, config: &MeshConfig, monitor: &Monitor) -> Result<Mesh> {
    config.validate()?;
    let mut groups: BTreeMap<Label, Vec<Point3>> = BTreeMap::new();
    for (p, label) in classified.points().points().iter().zip(classified.labels()) {
        if label.is_classified() {
            groups.entry(*label).or_default().push(*p);
        }
    }
    if groups.is_empty() {
        return Err(ScanError::Reconstruction("no ground or wall points to mesh".to_string()));
    }

    let total = groups.len() as u64;
    let mut mesh = Mesh::default();
    for (step, (label, points)) in groups.into_iter().enumerate() {
        monitor.checkpoint()?;
        monitor.report(step as u64, total, format!("Meshing {label}"));
        let sampled = voxel_downsample(&points, config.voxel_size);
        debug!("{label}: {} points downsampled to {}", points.len(), sampled.len());
        match surface_mesh(&sampled, config.alpha) {
            Some(part) => {
                debug!("{label}: {} triangles", part.face_count());
                mesh.append(part);
            }
            None => warn!("{label}: no triangle within alpha {}", config.alpha),
        }
    }
    monitor.report(total, total, "Mesh complete");
    if mesh.is_empty() {
        return Err(ScanError::Reconstruction(format!(
            "point density too low for alpha {}",
            config.alpha
        )));
    }
    info!("Mesh has {} vertices and {} triangles", mesh.vertex_count(), mesh.face_count());
    Ok(mesh)
}

/// Writes `mesh` as a Wavefront OBJ file.
pub fn write_obj(path: &str, mesh: &Mesh) -> Result<()> {
    let mut out = String::from("# tunnel_scan surface mesh\n");
    for v in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
    }
    for f in &mesh.faces {
        let _ = writeln!(out, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1);
    }
    write_string(path, &out)?;
    Ok(())
}
