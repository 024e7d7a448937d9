//! Plain analysis summary handed to the report-writing collaborator.
//!
//! The summary carries numbers and labels only; turning it into prose is
//! left to the external reporting model named in [`ModelConfig`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{ClassificationStats, ClassifiedPointSet, Label};
use crate::cloud::ScanHeader;
use crate::compare::{ComparisonResult, DeviationStats};
use crate::config::ModelConfig;
use crate::damage::DamageReport;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::section::CrossSection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub file_name: String,
    pub point_count: u64,
    pub las_version: String,
    /// Extent along x, y and z.
    pub size: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceRow {
    pub label: Label,
    pub point_count: usize,
    pub vertical_extent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub stats: ClassificationStats,
    pub surfaces: Vec<SurfaceRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSummary {
    pub vertices: usize,
    pub triangles: usize,
    pub surface_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub position: f64,
    pub tolerance: f64,
    pub samples: usize,
    pub profile_vertices: usize,
    pub profile_length: f64,
    pub enclosed_area: f64,
    /// Lowest and highest elevation of the profile.
    pub elevation_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageSummary {
    pub surface_points: usize,
    pub damage_points: usize,
    pub max_distance: f64,
    pub length: Option<f64>,
    pub width: Option<f64>,
}

/// Everything known about one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub generated_at: DateTime<Utc>,
    pub model: ModelConfig,
    pub scan: Option<ScanSummary>,
    pub classification: Option<ClassificationSummary>,
    pub mesh: Option<MeshSummary>,
    pub section: Option<SectionSummary>,
    pub comparison: Option<DeviationStats>,
    pub damage: Option<DamageSummary>,
}

impl AnalysisSummary {
    pub fn new(model: ModelConfig) -> Self {
        Self {
            generated_at: Utc::now(),
            model,
            scan: None,
            classification: None,
            mesh: None,
            section: None,
            comparison: None,
            damage: None,
        }
    }

    pub fn with_scan(mut self, header: &ScanHeader) -> Self {
        let size = header.bounds.size();
        self.scan = Some(ScanSummary {
            file_name: header.file_name(),
            point_count: header.point_count,
            las_version: header.version.clone(),
            size: [size.x, size.y, size.z],
        });
        self
    }

    pub fn with_classification(mut self, classified: &ClassifiedPointSet) -> Self {
        self.classification = Some(ClassificationSummary {
            stats: classified.stats(),
            surfaces: classified
                .surfaces()
                .iter()
                .map(|s| SurfaceRow {
                    label: s.label,
                    point_count: s.point_count,
                    vertical_extent: s.vertical_extent,
                })
                .collect(),
        });
        self
    }

    pub fn with_mesh(mut self, mesh: &Mesh) -> Self {
        self.mesh = Some(MeshSummary {
            vertices: mesh.vertex_count(),
            triangles: mesh.face_count(),
            surface_area: mesh.surface_area(),
        });
        self
    }

    pub fn with_section(mut self, section: &CrossSection) -> Self {
        self.section = Some(SectionSummary {
            position: section.position,
            tolerance: section.tolerance,
            samples: section.samples.len(),
            profile_vertices: section.profile.len(),
            profile_length: section.profile.length(),
            enclosed_area: section.profile.enclosed_area(),
            elevation_range: section.profile.elevation_range(),
        });
        self
    }

    pub fn with_comparison(mut self, comparison: &ComparisonResult) -> Self {
        self.comparison = Some(comparison.stats.clone());
        self
    }

    pub fn with_damage(mut self, report: &DamageReport) -> Self {
        self.damage = Some(DamageSummary {
            surface_points: report.surface_points,
            damage_points: report.damage_indices.len(),
            max_distance: report.max_distance,
            length: report.extent.map(|e| e.length),
            width: report.extent.map(|e| e.width),
        });
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(std::io::Error::from)?)
    }

    /// Human-readable lines, one fact per line.
    pub fn rows(&self) -> Vec<String> {
        let mut rows = vec![format!("Generated: {}", self.generated_at.to_rfc3339())];
        if let Some(scan) = &self.scan {
            rows.push(format!("File: {}", scan.file_name));
            rows.push(format!("Points: {}", scan.point_count));
            rows.push(format!(
                "Extent: {:.2} x {:.2} x {:.2} m",
                scan.size[0], scan.size[1], scan.size[2]
            ));
        }
        if let Some(c) = &self.classification {
            rows.push(format!("Ground points: {}", c.stats.ground_points));
            for (i, n) in c.stats.wall_points.iter().enumerate() {
                rows.push(format!("{} points: {}", Label::Wall(i + 1), n));
            }
            rows.push(format!("Unclassified points: {}", c.stats.unclassified_points));
        }
        if let Some(m) = &self.mesh {
            rows.push(format!(
                "Mesh: {} vertices, {} triangles, {:.2} m2",
                m.vertices, m.triangles, m.surface_area
            ));
        }
        if let Some(s) = &self.section {
            rows.push(format!(
                "Section at {} (+/- {}): {} samples, {} boundary vertices",
                s.position, s.tolerance, s.samples, s.profile_vertices
            ));
            rows.push(format!("Section area: {:.3} m2", s.enclosed_area));
        }
        if let Some(d) = &self.comparison {
            rows.push(format!("Matched vertices: {} ({} outside design)", d.matched, d.unmatched));
            rows.push(format!(
                "Deviation: max {:.3}, min {:.3}, mean {:.3}, rms {:.3} m",
                d.max_deviation, d.min_deviation, d.mean_deviation, d.rms_deviation
            ));
            rows.push(format!("Area difference: {:.3} m2", d.area_difference));
        }
        if let Some(d) = &self.damage {
            rows.push(format!(
                "Damage: {} points, max distance {:.3} m",
                d.damage_points, d.max_distance
            ));
        }
        rows
    }
}
