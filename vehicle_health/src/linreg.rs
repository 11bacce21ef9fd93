//! Single-feature ordinary least squares regression.
//!
//! Fits the income model (years of experience against salary). The serving
//! path never consumes it; the artifact is produced for parity with the
//! training pipeline's other outputs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

/// Ordinary least squares over one feature: `y = slope * x + intercept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    slope: Option<f32>,
    intercept: f32,
}

impl LinearRegression {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slope: None,
            intercept: 0.0,
        }
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.slope.is_some()
    }

    /// Returns the fitted slope.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn slope(&self) -> Result<f32> {
        self.slope
            .ok_or(HealthError::ModelUnavailable("regression not fitted"))
    }

    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Fits slope and intercept by minimizing the residual sum of squares.
    ///
    /// # Errors
    ///
    /// Returns an error on mismatched lengths, fewer than two samples, or
    /// a degenerate (constant) feature column.
    pub fn fit(&mut self, x: &[f32], y: &[f32]) -> Result<()> {
        if x.len() != y.len() {
            return Err(HealthError::Computation(format!(
                "sample count mismatch: {} features, {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(HealthError::Computation(
                "need at least two samples to fit a line".to_string(),
            ));
        }

        let n = x.len() as f32;
        let mean_x = x.iter().sum::<f32>() / n;
        let mean_y = y.iter().sum::<f32>() / n;

        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            covariance += (xi - mean_x) * (yi - mean_y);
            variance += (xi - mean_x) * (xi - mean_x);
        }

        if variance == 0.0 {
            return Err(HealthError::Computation(
                "feature column is constant, slope is undefined".to_string(),
            ));
        }

        let slope = covariance / variance;
        self.intercept = mean_y - slope * mean_x;
        self.slope = Some(slope);
        Ok(())
    }

    /// Predicts targets for the given feature values.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted.
    pub fn predict(&self, x: &[f32]) -> Result<Vec<f32>> {
        let slope = self.slope()?;
        Ok(x.iter().map(|&xi| slope * xi + self.intercept).collect())
    }

    /// Saves the fitted model as a bincode artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| HealthError::Artifact(format!("serialization failed: {e}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a model from a bincode artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or does not deserialize.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| HealthError::Artifact(format!("deserialization failed: {e}")))
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}
