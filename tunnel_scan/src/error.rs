//! Error types for scan loading and analysis.

use std::path::PathBuf;
use thiserror::Error;

use crate::classify::ClassifiedPointSet;

/// Errors that can occur while loading or analysing a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input path does not resolve to a file.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The file is not a readable LAS/LAZ point cloud.
    #[error("invalid point cloud file {}: {reason}", path.display())]
    FileFormat { path: PathBuf, reason: String },

    /// Plane segmentation found fewer than two wall surfaces.
    ///
    /// The partial classification is kept so callers can inspect what was
    /// found before adjusting parameters.
    #[error("not enough walls found (need at least 2, found {found})")]
    InsufficientWalls {
        found: usize,
        partial: Box<ClassifiedPointSet>,
    },

    /// No classified point lies inside the requested slice.
    #[error("no points found near position {position} (tolerance {tolerance})")]
    EmptySlice { position: f64, tolerance: f64 },

    /// No actual vertex falls inside the design offset range.
    #[error(
        "no actual vertex lies within the design offset range: actual spans [{actual_min}, {actual_max}], design spans [{design_min}, {design_max}]"
    )]
    ProfileMismatch {
        actual_min: f64,
        actual_max: f64,
        design_min: f64,
        design_max: f64,
    },

    /// Mesh generation could not form a surface.
    #[error("mesh reconstruction failed: {0}")]
    Reconstruction(String),

    /// Damage analysis could not find a dominant surface.
    #[error("no dominant surface found ({inliers} inliers, need {required})")]
    NoDominantSurface { inliers: usize, required: usize },

    /// A design profile could not be parsed.
    #[error("invalid profile {}: {reason}", path.display())]
    InvalidProfile { path: PathBuf, reason: String },

    /// A configuration value is out of range or malformed.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// A session step ran before the data it needs was produced.
    #[error("{0} is required for this operation")]
    MissingInput(&'static str),

    /// A background result refers to a point set that is no longer loaded.
    #[error("result belongs to a point set that is no longer loaded")]
    StaleResult,

    /// A worker thread panicked.
    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),

    /// Underlying IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ScanError::FileFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        ScanError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Actionable advice for the user matching each failure kind.
    pub fn hint(&self) -> &'static str {
        match self {
            ScanError::FileNotFound { .. } => "check the path and select an existing .las or .laz file",
            ScanError::FileFormat { .. } => "select a valid .las or .laz point cloud file",
            ScanError::InsufficientWalls { .. } => {
                "adjust RANSAC distance, lower the minimum wall height or widen the wall angle"
            }
            ScanError::EmptySlice { .. } => {
                "choose a position inside the scanned range or increase the slice tolerance"
            }
            ScanError::ProfileMismatch { .. } => {
                "check that the design profile uses the same offset convention as the scan"
            }
            ScanError::Reconstruction(_) => "increase the alpha radius or decrease the voxel size",
            ScanError::NoDominantSurface { .. } => "increase the RANSAC distance",
            ScanError::InvalidProfile { .. } => "provide a CSV with an X,Z header and at least two rows",
            ScanError::InvalidParameter { .. } => "correct the parameter value and retry",
            ScanError::Cancelled => "run the operation again when ready",
            ScanError::MissingInput(_) => "run the earlier analysis step first",
            ScanError::StaleResult => "rerun the operation on the currently loaded file",
            ScanError::WorkerPanicked(_) => "rerun the operation; report the failure if it repeats",
            ScanError::Io(_) => "check file permissions and free disk space",
        }
    }
}

/// Result type for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
