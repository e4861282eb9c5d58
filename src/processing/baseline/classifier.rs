use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{BaselineState, Reading};

/// Qualitative air quality label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQualityStatus {
    Calibrating,
    Excellent,
    Good,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl AirQualityStatus {
    /// Status band for a 0-100 score
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            AirQualityStatus::Excellent
        } else if score >= 65.0 {
            AirQualityStatus::Good
        } else if score >= 45.0 {
            AirQualityStatus::Moderate
        } else if score >= 25.0 {
            AirQualityStatus::Poor
        } else {
            AirQualityStatus::VeryPoor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AirQualityStatus::Calibrating => "Calibrating",
            AirQualityStatus::Excellent => "Excellent",
            AirQualityStatus::Good => "Good",
            AirQualityStatus::Moderate => "Moderate",
            AirQualityStatus::Poor => "Poor",
            AirQualityStatus::VeryPoor => "Very Poor",
        }
    }

    fn condition(&self) -> &'static str {
        match self {
            AirQualityStatus::Calibrating => "calibrating",
            AirQualityStatus::Excellent => "excellent conditions",
            AirQualityStatus::Good => "good conditions",
            AirQualityStatus::Moderate => "acceptable conditions",
            AirQualityStatus::Poor => "poor conditions, consider ventilating",
            AirQualityStatus::VeryPoor => "very poor conditions, ventilate the room",
        }
    }
}

impl fmt::Display for AirQualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Piecewise-linear remap of percentage-of-baseline onto 0-100
///
/// Readings at or above the baseline score highest.
pub fn score_from_percentage(percentage: f64) -> f64 {
    if percentage >= 95.0 {
        (70.0 + (percentage - 95.0) * 2.0).min(100.0)
    } else if percentage >= 80.0 {
        50.0 + (percentage - 80.0) * (20.0 / 15.0)
    } else if percentage >= 60.0 {
        30.0 + (percentage - 60.0)
    } else if percentage >= 40.0 {
        15.0 + (percentage - 40.0) * 0.75
    } else {
        (percentage * 0.375).max(0.0)
    }
}

/// Full payload for one classified reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub timestamp: DateTime<Utc>,
    pub gas_resistance: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub air_quality_percentage: Option<f64>,
    pub air_quality_score: Option<f64>,
    pub air_quality_status: AirQualityStatus,
    pub description: String,
    pub baseline_value: Option<f64>,
    pub baseline_std: Option<f64>,
    pub baseline_updated: bool,
    pub total_readings: usize,
    pub calibration_complete: bool,
    pub fixed_baseline_mode: bool,
}

impl ClassificationResult {
    pub fn with_baseline_updated(mut self, updated: bool) -> Self {
        self.baseline_updated = updated;
        self
    }
}

/// Scores readings against the current baseline
pub struct ReadingClassifier {
    min_readings_for_baseline: usize,
}

impl ReadingClassifier {
    pub fn new(min_readings_for_baseline: usize) -> Self {
        Self {
            min_readings_for_baseline,
        }
    }

    pub fn classify(&self, reading: &Reading, state: &BaselineState) -> ClassificationResult {
        let total = state.readings.len();

        let (percentage, score, status, description) = match state.baseline_value {
            None => (
                None,
                None,
                AirQualityStatus::Calibrating,
                format!(
                    "Collecting baseline data ({}/{} readings)",
                    total, self.min_readings_for_baseline
                ),
            ),
            Some(baseline) => {
                let percentage = reading.value / baseline * 100.0;
                let score = score_from_percentage(percentage);
                let (status, description) = self.describe(percentage, score, state);
                (Some(percentage), Some(score), status, description)
            }
        };

        ClassificationResult {
            timestamp: reading.timestamp,
            gas_resistance: reading.value,
            temperature: reading.temperature,
            humidity: reading.humidity,
            air_quality_percentage: percentage,
            air_quality_score: score,
            air_quality_status: status,
            description,
            baseline_value: state.baseline_value,
            baseline_std: state.baseline_std,
            baseline_updated: false,
            total_readings: total,
            calibration_complete: state.calibration_complete,
            fixed_baseline_mode: state.fixed_baseline_mode,
        }
    }

    fn describe(
        &self,
        percentage: f64,
        score: f64,
        state: &BaselineState,
    ) -> (AirQualityStatus, String) {
        if !state.calibration_complete {
            let progress = if state.readings.len() < self.min_readings_for_baseline {
                format!(
                    "{}/{} readings",
                    state.readings.len(),
                    self.min_readings_for_baseline
                )
            } else {
                "waiting for a stable window".to_string()
            };
            return (
                AirQualityStatus::Calibrating,
                format!(
                    "Provisional: {:.0}% of rolling baseline, calibration in progress ({})",
                    percentage, progress
                ),
            );
        }

        let status = AirQualityStatus::from_score(score);
        let kind = if state.fixed_baseline_mode {
            "fixed"
        } else {
            "rolling"
        };

        (
            status,
            format!(
                "Air quality is {:.0}% of {} baseline - {}",
                percentage,
                kind,
                status.condition()
            ),
        )
    }
}
