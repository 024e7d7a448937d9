//! Analysis session holding the loaded scan and everything derived from it.
//!
//! Results are committed only when an operation succeeds, so a cancelled
//! or failed step leaves earlier results in place. Loading a new scan drops
//! every structure derived from the previous one.

use std::sync::Arc;

use log::info;

use crate::classify::{classify, ClassifiedPointSet};
use crate::cloud::{PointSet, ScanHeader};
use crate::compare::{compare, ComparisonResult};
use crate::config::{AnalysisConfig, ModelConfig};
use crate::damage::{detect_damage, DamageReport};
use crate::error::{Result, ScanError};
use crate::io::csv::read_design_profile;
use crate::io::las::load_point_set_with;
use crate::mesh::{reconstruct, Mesh};
use crate::progress::Monitor;
use crate::section::{extract, CrossSection, Profile, SectionRequest};
use crate::summary::AnalysisSummary;
use crate::task::{self, TaskHandle};

#[derive(Debug, Default)]
pub struct Session {
    config: AnalysisConfig,
    header: Option<ScanHeader>,
    points: Option<Arc<PointSet>>,
    classified: Option<ClassifiedPointSet>,
    mesh: Option<Mesh>,
    section: Option<CrossSection>,
    design: Option<Profile>,
    comparison: Option<ComparisonResult>,
    damage: Option<DamageReport>,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replaces the analysis parameters. Existing results are kept until
    /// the corresponding step is rerun.
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn header(&self) -> Option<&ScanHeader> {
        self.header.as_ref()
    }

    pub fn points(&self) -> Option<&Arc<PointSet>> {
        self.points.as_ref()
    }

    pub fn classification(&self) -> Option<&ClassifiedPointSet> {
        self.classified.as_ref()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn section(&self) -> Option<&CrossSection> {
        self.section.as_ref()
    }

    pub fn design(&self) -> Option<&Profile> {
        self.design.as_ref()
    }

    pub fn comparison(&self) -> Option<&ComparisonResult> {
        self.comparison.as_ref()
    }

    pub fn damage(&self) -> Option<&DamageReport> {
        self.damage.as_ref()
    }

    fn require_points(&self) -> Result<&Arc<PointSet>> {
        self.points.as_ref().ok_or(ScanError::MissingInput("a loaded point cloud"))
    }

    fn require_classification(&self) -> Result<&ClassifiedPointSet> {
        self.classified
            .as_ref()
            .ok_or(ScanError::MissingInput("a classified point cloud"))
    }

    /// Loads a scan, replacing the current one and dropping all derived
    /// results. The design profile is kept.
    pub fn load(&mut self, path: &str, monitor: &Monitor) -> Result<&ScanHeader> {
        let (points, header) = load_point_set_with(path, monitor)?;
        self.points = Some(Arc::new(points));
        self.classified = None;
        self.mesh = None;
        self.section = None;
        self.comparison = None;
        self.damage = None;
        info!("Session loaded {}", header.file_name());
        Ok(self.header.insert(header))
    }

    /// Classifies the loaded points.
    ///
    /// On [`ScanError::InsufficientWalls`] the previous classification stays
    /// current; the partial result travels in the error.
    pub fn classify(&mut self, monitor: &Monitor) -> Result<&ClassifiedPointSet> {
        let points = Arc::clone(self.require_points()?);
        let classified = classify(points, &self.config.classifier, monitor)?;
        self.commit_classification(classified)?;
        self.require_classification()
    }

    /// Starts classification of the loaded points on a worker thread. The
    /// result is applied with [`Session::commit_classification`].
    pub fn classify_in_background(&self) -> Result<TaskHandle<ClassifiedPointSet>> {
        let points = Arc::clone(self.require_points()?);
        let config = self.config.classifier.clone();
        task::spawn("classify", move |monitor| classify(points, &config, monitor))
    }

    /// Makes `classified` current, dropping results derived from the old
    /// classification. Fails with [`ScanError::StaleResult`] when it was
    /// computed for a point set that is no longer loaded.
    pub fn commit_classification(&mut self, classified: ClassifiedPointSet) -> Result<()> {
        let current = self.require_points()?;
        if !classified.belongs_to(current) {
            return Err(ScanError::StaleResult);
        }
        self.classified = Some(classified);
        self.mesh = None;
        self.section = None;
        self.comparison = None;
        Ok(())
    }

    pub fn reconstruct(&mut self, monitor: &Monitor) -> Result<&Mesh> {
        let mesh = reconstruct(self.require_classification()?, &self.config.mesh, monitor)?;
        Ok(self.mesh.insert(mesh))
    }

    /// Cuts a cross-section at `position` with the configured tolerance,
    /// axis and alpha.
    pub fn extract_section(&mut self, position: f64, monitor: &Monitor) -> Result<&CrossSection> {
        let request = SectionRequest::new(position, &self.config.section);
        let section = extract(self.require_classification()?, &request, monitor)?;
        self.comparison = None;
        Ok(self.section.insert(section))
    }

    pub fn import_design(&mut self, path: &str) -> Result<&Profile> {
        let design = read_design_profile(path)?;
        self.comparison = None;
        Ok(self.design.insert(design))
    }

    /// Compares the current section profile against the design profile.
    pub fn compare(&mut self) -> Result<&ComparisonResult> {
        let section = self
            .section
            .as_ref()
            .ok_or(ScanError::MissingInput("an extracted cross-section"))?;
        let design = self
            .design
            .as_ref()
            .ok_or(ScanError::MissingInput("a design profile"))?;
        let result = compare(&section.profile, design, &self.config.compare)?;
        Ok(self.comparison.insert(result))
    }

    /// Runs damage detection on the whole loaded point set.
    pub fn detect_damage(&mut self, monitor: &Monitor) -> Result<&DamageReport> {
        let report = detect_damage(self.require_points()?, &self.config.classifier, monitor)?;
        Ok(self.damage.insert(report))
    }

    /// Summary of every result currently held.
    pub fn summary(&self, model: &ModelConfig) -> AnalysisSummary {
        let mut summary = AnalysisSummary::new(model.clone());
        if let Some(header) = &self.header {
            summary = summary.with_scan(header);
        }
        if let Some(classified) = &self.classified {
            summary = summary.with_classification(classified);
        }
        if let Some(mesh) = &self.mesh {
            summary = summary.with_mesh(mesh);
        }
        if let Some(section) = &self.section {
            summary = summary.with_section(section);
        }
        if let Some(comparison) = &self.comparison {
            summary = summary.with_comparison(comparison);
        }
        if let Some(damage) = &self.damage {
            summary = summary.with_damage(damage);
        }
        summary
    }
}
