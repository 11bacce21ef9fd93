//! Mapping from workshop readings to classifier features.
//!
//! The classifier was trained on machine telemetry with the column order
//! `[air_temp_k, process_temp_k, rotation_rpm, torque_nm, tool_wear_min]`.
//! None of those are measured directly at the workshop, so the readings a
//! mechanic can actually take are converted with fixed formulas. The order
//! in [`FEATURE_NAMES`] is authoritative; training and serving both go
//! through [`FeatureVector`] so they cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

/// Authoritative feature order, matching the training dataset columns.
pub const FEATURE_NAMES: [&str; 5] = [
    "air_temp_k",
    "process_temp_k",
    "rotation_rpm",
    "torque_nm",
    "tool_wear_min",
];

/// Assumed workshop ambient temperature (300 K, ~27 C).
pub const AMBIENT_TEMP_K: f32 = 300.0;

const KELVIN_OFFSET: f32 = 273.15;
const TORQUE_BASE_NM: f32 = 60.0;
const TORQUE_FLOOR_NM: f32 = 10.0;
const WEAR_PER_VIBE: f32 = 15.0;

/// The six readings collected from the form, already validated as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub engine_temp_c: f32,
    pub battery_voltage: f32,
    pub chain_slack_mm: f32,
    pub vibration_level: f32,
    pub engine_rpm: f32,
    pub work_experience_years: f32,
}

impl SensorReadings {
    /// Validates the raw form fields and builds a typed reading set.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::InvalidInput`] naming the first field that
    /// does not parse as a number.
    pub fn from_form(
        temp: &str,
        voltage: &str,
        chain: &str,
        vibe: &str,
        rpm: &str,
        work_exp: &str,
    ) -> Result<Self> {
        Ok(Self {
            engine_temp_c: parse_field("temp", temp)?,
            battery_voltage: parse_field("voltage", voltage)?,
            chain_slack_mm: parse_field("chain", chain)?,
            vibration_level: parse_field("vibe", vibe)?,
            engine_rpm: parse_field("rpm", rpm)?,
            work_experience_years: parse_field("work_exp", work_exp)?,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .map_err(|_| HealthError::InvalidInput {
            field,
            value: value.to_string(),
        })
}

/// Fixed-order feature vector consumed by the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; 5]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Converts readings into the feature order the classifier expects.
///
/// - process temperature: engine Celsius shifted to Kelvin
/// - torque: loose chain means poor torque transfer, floor-clamped at 10 Nm
/// - wear: vibration scaled by 15, unbounded above
#[must_use]
pub fn derive_features(r: &SensorReadings) -> FeatureVector {
    let process_temp_k = r.engine_temp_c + KELVIN_OFFSET;
    let torque_nm = (TORQUE_BASE_NM - r.chain_slack_mm).max(TORQUE_FLOOR_NM);
    let tool_wear_min = r.vibration_level * WEAR_PER_VIBE;

    FeatureVector([
        AMBIENT_TEMP_K,
        process_temp_k,
        r.engine_rpm,
        torque_nm,
        tool_wear_min,
    ])
}
