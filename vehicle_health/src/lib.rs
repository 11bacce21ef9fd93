//! Core logic for the vehicle health check service.
//!
//! Turns six manually collected readings into the 5-feature vector the
//! failure classifier was trained on, scores the result and builds the
//! repair report. Also hosts the offline side: CSV dataset loaders, the
//! tree-ensemble classifier, the income regressor and the bike catalog.

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forest;
pub mod linreg;
pub mod report;

pub use error::{HealthError, Result};
pub use features::{derive_features, FeatureVector, SensorReadings, FEATURE_NAMES};
pub use forest::RandomForestClassifier;
pub use report::{diagnose, health_score, HealthReport, Issue, Status};
