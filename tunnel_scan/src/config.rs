//! Application and analysis configuration.
//!
//! Defaults can be overridden from a JSON file and from environment
//! variables; environment values win.

use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::cloud::Axis;
use crate::error::{Result, ScanError};

/// Configuration of the external report-generation model.
///
/// The core never contacts the model; the values are passed through to the
/// reporting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_name: String,
    pub temperature: f64,
    pub max_iterations: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "models/gemini-pro-latest".to_string(),
            temperature: 0.0,
            max_iterations: 30,
        }
    }
}

/// Parameters of the ground/wall plane classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum vertical extent (m) for a vertical plane to count as a wall.
    pub min_wall_height: f64,
    /// Inlier distance threshold (m).
    pub ransac_distance: f64,
    /// Maximum angle (deg) between a ground normal and the vertical.
    pub ground_angle: f64,
    /// Maximum angle (deg) between a wall normal and the horizontal plane.
    pub wall_angle: f64,
    /// Sampling budget per plane.
    pub ransac_iterations: usize,
    /// Maximum number of planes extracted before stopping.
    pub max_planes: usize,
    /// Planes with fewer inliers end the segmentation.
    pub min_plane_points: usize,
    /// Seed for the sampling RNG; equal seeds give equal labels.
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_wall_height: 2.0,
            ransac_distance: 0.1,
            ground_angle: 15.0,
            wall_angle: 30.0,
            ransac_iterations: 1000,
            max_planes: 15,
            min_plane_points: 200,
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        positive("min_wall_height", self.min_wall_height)?;
        positive("ransac_distance", self.ransac_distance)?;
        angle("ground_angle", self.ground_angle)?;
        angle("wall_angle", self.wall_angle)?;
        if self.ransac_iterations == 0 {
            return Err(ScanError::invalid_parameter("ransac_iterations", "must be at least 1"));
        }
        if self.max_planes == 0 {
            return Err(ScanError::invalid_parameter("max_planes", "must be at least 1"));
        }
        if self.min_plane_points < 3 {
            return Err(ScanError::invalid_parameter("min_plane_points", "must be at least 3"));
        }
        Ok(())
    }
}

/// Parameters of the surface mesh reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Edge length (m) of the downsampling voxel grid; 0 disables it.
    pub voxel_size: f64,
    /// Largest triangle circumradius (m) kept in the mesh.
    pub alpha: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.1,
            alpha: 0.5,
        }
    }
}

impl MeshConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size >= 0.0) || !self.voxel_size.is_finite() {
            return Err(ScanError::invalid_parameter("voxel_size", "must be zero or positive"));
        }
        positive("alpha", self.alpha)
    }
}

/// Parameters of cross-section extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Half thickness (m) of the slice.
    pub tolerance: f64,
    /// Alpha-shape parameter; triangles with circumradius above `1 / alpha`
    /// are dropped.
    pub alpha: f64,
    /// Long axis of the tunnel.
    pub axis: Axis,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.5,
            alpha: 0.5,
            axis: Axis::Y,
        }
    }
}

impl SectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance >= 0.0) || !self.tolerance.is_finite() {
            return Err(ScanError::invalid_parameter("tolerance", "must be zero or positive"));
        }
        positive("section alpha", self.alpha)
    }
}

/// How actual profile vertices are matched against the design profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchRule {
    /// Design elevation linearly interpolated at the actual offset.
    #[default]
    Interpolate,
    /// Elevation of the design vertex with the nearest offset.
    NearestVertex,
}

/// Parameters of profile comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub rule: MatchRule,
    /// Widens the design offset range when deciding which actual vertices
    /// overlap it.
    pub range_margin: f64,
    /// Offset distance (m) within which a steep design segment, such as a
    /// wall, still covers an actual vertex.
    pub offset_band: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            rule: MatchRule::Interpolate,
            range_margin: 0.0,
            offset_band: 0.1,
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("range_margin", self.range_margin), ("offset_band", self.offset_band)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ScanError::invalid_parameter(name, "must be zero or positive"));
            }
        }
        Ok(())
    }
}

/// All analysis parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub classifier: ClassifierConfig,
    pub mesh: MeshConfig,
    pub section: SectionConfig,
    pub compare: CompareConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.mesh.validate()?;
        self.section.validate()?;
        self.compare.validate()
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            analysis: AnalysisConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a JSON configuration file, then applies environment overrides.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let contents = crate::io::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&contents)
            .map_err(|e| ScanError::invalid_parameter("config", format!("{path}: {e}")))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides using `lookup` to resolve variable names.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MODEL_NAME") {
            self.model.model_name = v;
        }
        override_parsed(&lookup, "TEMPERATURE", &mut self.model.temperature)?;
        override_parsed(&lookup, "MAX_ITERATIONS", &mut self.model.max_iterations)?;
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        let c = &mut self.analysis.classifier;
        override_parsed(&lookup, "MIN_WALL_HEIGHT", &mut c.min_wall_height)?;
        override_parsed(&lookup, "RANSAC_DISTANCE", &mut c.ransac_distance)?;
        override_parsed(&lookup, "GROUND_ANGLE", &mut c.ground_angle)?;
        override_parsed(&lookup, "WALL_ANGLE", &mut c.wall_angle)?;
        override_parsed(&lookup, "RANSAC_ITERATIONS", &mut c.ransac_iterations)?;
        override_parsed(&lookup, "MAX_PLANES", &mut c.max_planes)?;
        override_parsed(&lookup, "MIN_PLANE_POINTS", &mut c.min_plane_points)?;
        override_parsed(&lookup, "RANSAC_SEED", &mut c.seed)?;
        override_parsed(&lookup, "VOXEL_SIZE", &mut self.analysis.mesh.voxel_size)?;
        override_parsed(&lookup, "ALPHA_SHAPE_ALPHA", &mut self.analysis.mesh.alpha)?;
        override_parsed(&lookup, "SECTION_ALPHA", &mut self.analysis.section.alpha)?;
        override_parsed(&lookup, "SLICE_TOLERANCE", &mut self.analysis.section.tolerance)?;
        override_parsed(&lookup, "COMPARE_OFFSET_BAND", &mut self.analysis.compare.offset_band)?;
        Ok(())
    }

    /// Parsed `log_level`.
    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| ScanError::invalid_parameter("log_level", format!("unknown level '{}'", self.log_level)))
    }

    pub fn validate(&self) -> Result<()> {
        self.log_level_filter()?;
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ScanError::invalid_parameter("temperature", "must be within [0, 2]"));
        }
        self.analysis.validate()
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse::<T>()
            .map_err(|_| ScanError::invalid_parameter(key, format!("cannot parse '{raw}'")))?;
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ScanError::invalid_parameter(name, format!("must be positive, got {value}")))
    }
}

fn angle(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 90.0 {
        Ok(())
    } else {
        Err(ScanError::invalid_parameter(name, format!("must be within (0, 90], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.model.model_name, "models/gemini-pro-latest");
        assert_eq!(config.analysis.classifier.min_wall_height, 2.0);
        assert_eq!(config.analysis.classifier.ransac_distance, 0.1);
        assert_eq!(config.analysis.mesh.voxel_size, 0.1);
        assert_eq!(config.log_level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("MODEL_NAME", "custom-model"),
            ("TEMPERATURE", "0.5"),
            ("LOG_LEVEL", "debug"),
            ("RANSAC_DISTANCE", "0.05"),
            ("MIN_WALL_HEIGHT", "1.5"),
            ("MAX_PLANES", "4"),
            ("COMPARE_OFFSET_BAND", "0.25"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model.model_name, "custom-model");
        assert_eq!(config.model.temperature, 0.5);
        assert_eq!(config.log_level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(config.analysis.classifier.ransac_distance, 0.05);
        assert_eq!(config.analysis.classifier.min_wall_height, 1.5);
        assert_eq!(config.analysis.classifier.max_planes, 4);
        assert_eq!(config.analysis.compare.offset_band, 0.25);
    }

    #[test]
    fn malformed_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|k| (k == "TEMPERATURE").then(|| "hot".to_string()))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidParameter { ref name, .. } if name == "TEMPERATURE"));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let mut config = AppConfig::default();
        config.analysis.classifier.wall_angle = 120.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.analysis.compare.offset_band = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{ "analysis": { "classifier": { "min_wall_height": 1.0 } } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.analysis.classifier.min_wall_height, 1.0);
        assert_eq!(config.analysis.classifier.ransac_distance, 0.1);
        assert_eq!(config.log_level, "info");
    }
}
