//! Core library for tunnel LiDAR scan analysis.
//!
//! The pipeline loads a LAS/LAZ point cloud, labels ground and wall points
//! by RANSAC plane segmentation, and derives surface meshes, cross-section
//! profiles and design deviations from the labelled points.

pub mod classify;
pub mod cloud;
pub mod compare;
pub mod config;
pub mod damage;
pub mod error;
pub mod geometry;
pub mod io;
pub mod logging;
pub mod mesh;
pub mod progress;
pub mod ransac;
pub mod section;
pub mod session;
pub mod summary;
pub mod task;

pub use classify::{classify, ClassifiedPointSet, Label};
pub use cloud::{Axis, PointSet, ScanHeader};
pub use config::{AnalysisConfig, AppConfig};
pub use error::{Result, ScanError};
pub use progress::{CancelToken, Monitor, Progress};
pub use section::{CrossSection, Profile};
pub use session::Session;
