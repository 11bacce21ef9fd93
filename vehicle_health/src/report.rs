//! Health scoring and the rule-based repair report.

use serde::Serialize;

use crate::error::{HealthError, Result};
use crate::features::SensorReadings;

/// Probability used when no classifier artifact is loaded.
pub const FALLBACK_FAIL_PROBABILITY: f32 = 0.5;

const SERVICE_SCORE: u8 = 80;
const CRITICAL_SCORE: u8 = 50;

const ENGINE_TEMP_LIMIT_C: f32 = 105.0;
const MIN_BATTERY_VOLTAGE: f32 = 12.4;
const VIBRATION_LIMIT: f32 = 5.0;
const CHAIN_SLACK_LIMIT_MM: f32 = 35.0;

const ADVICE_GOOD: &str = "Vehicle condition is good.";
const ADVICE_UNSAFE: &str = "Unsafe to ride. Immediate repair required.";

const INCOME_PER_YEAR: f32 = 500.0;
const INCOME_BASE: f32 = 1500.0;

/// Three-tier condition classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Operational,
    ServiceNeeded,
    CriticalRisk,
}

impl Status {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Status::Operational => "OPERATIONAL",
            Status::ServiceNeeded => "SERVICE NEEDED",
            Status::CriticalRisk => "CRITICAL RISK",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Status::Operational => "#00d26a",
            Status::ServiceNeeded => "#fcd53f",
            Status::CriticalRisk => "#f8312f",
        }
    }
}

/// A single flagged part with its recommended action and fixed cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub part: &'static str,
    pub action: &'static str,
    pub cost: u32,
}

/// The per-request report rendered back to the rider.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub score: u8,
    pub status: Status,
    pub advice: &'static str,
    pub issues: Vec<Issue>,
    pub total_cost: u32,
}

/// Maps a failure probability onto the 0-100 health score.
#[must_use]
pub fn health_score(fail_probability: f32) -> u8 {
    ((1.0 - fail_probability) * 100.0).clamp(0.0, 100.0).round() as u8
}

/// Builds the report for a given score and the readings behind it.
///
/// Diagnostic checks only run below the service threshold; a borderline
/// reading at score 80+ is never flagged. The critical tier is evaluated
/// afterwards and overrides status, color and advice while keeping the
/// issue list accumulated by the service tier.
#[must_use]
pub fn diagnose(score: u8, readings: &SensorReadings) -> HealthReport {
    let mut report = HealthReport {
        score,
        status: Status::Operational,
        advice: ADVICE_GOOD,
        issues: Vec::new(),
        total_cost: 0,
    };

    if score < SERVICE_SCORE {
        report.status = Status::ServiceNeeded;

        if readings.engine_temp_c > ENGINE_TEMP_LIMIT_C {
            push_issue(&mut report, "Coolant System", "Check Fan/Fluid", 40);
        }
        if readings.battery_voltage < MIN_BATTERY_VOLTAGE {
            push_issue(&mut report, "Battery", "Replace", 50);
        }
        if readings.vibration_level > VIBRATION_LIMIT {
            push_issue(&mut report, "Mountings", "Tighten", 20);
        }
        if readings.chain_slack_mm > CHAIN_SLACK_LIMIT_MM {
            push_issue(&mut report, "Chain", "Tighten/Replace", 30);
        }
    }

    if score < CRITICAL_SCORE {
        report.status = Status::CriticalRisk;
        report.advice = ADVICE_UNSAFE;
    }

    report
}

fn push_issue(report: &mut HealthReport, part: &'static str, action: &'static str, cost: u32) {
    report.issues.push(Issue { part, action, cost });
    report.total_cost += cost;
}

/// Rough monthly income estimate from years of riding experience.
#[must_use]
pub fn estimated_income(work_experience_years: f32) -> f32 {
    work_experience_years * INCOME_PER_YEAR + INCOME_BASE
}

/// Repair cost as a percentage of estimated income, rounded to 1 decimal.
///
/// # Errors
///
/// Returns [`HealthError::Computation`] when the income estimate is not
/// positive (negative experience pushes the formula to zero or below).
pub fn financial_impact(total_cost: u32, work_experience_years: f32) -> Result<f32> {
    let income = estimated_income(work_experience_years);
    if income <= 0.0 {
        return Err(HealthError::Computation(format!(
            "estimated income {income} is not positive"
        )));
    }
    let pct = total_cost as f32 / income * 100.0;
    Ok((pct * 10.0).round() / 10.0)
}
