use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single gas resistance reading held in the baseline window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Ohms
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

impl Reading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            temperature: None,
            humidity: None,
        }
    }

    pub fn with_environment(mut self, temperature: Option<f64>, humidity: Option<f64>) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self
    }
}

/// Where the estimator is in its calibration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPhase {
    /// Gathering readings; the baseline is absent or not yet trusted
    Collecting,
    /// Baseline trusted and still recomputed from the window
    Calibrated,
    /// Baseline frozen by an operator
    Locked,
}

/// Persistent aggregate: the reading window plus derived baseline fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineState {
    #[serde(default)]
    pub readings: VecDeque<Reading>,
    #[serde(default)]
    pub baseline_value: Option<f64>,
    #[serde(default)]
    pub baseline_std: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub calibration_complete: bool,
    #[serde(default)]
    pub fixed_baseline_mode: bool,
    #[serde(default)]
    pub fixed_baseline_timestamp: Option<DateTime<Utc>>,
}

impl Default for BaselineState {
    fn default() -> Self {
        Self::empty_at(Utc::now())
    }
}

impl BaselineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty_at(created: DateTime<Utc>) -> Self {
        Self {
            readings: VecDeque::new(),
            baseline_value: None,
            baseline_std: None,
            last_updated: None,
            created,
            calibration_complete: false,
            fixed_baseline_mode: false,
            fixed_baseline_timestamp: None,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        if self.fixed_baseline_mode {
            CalibrationPhase::Locked
        } else if self.calibration_complete {
            CalibrationPhase::Calibrated
        } else {
            CalibrationPhase::Collecting
        }
    }

    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.readings.back().map(|r| r.timestamp)
    }

    /// Window values in chronological order
    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }

    /// Evict readings at or before `cutoff` from the front of the window
    ///
    /// Returns the number of evicted readings.
    pub fn prune_until(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        while self
            .readings
            .front()
            .is_some_and(|oldest| oldest.timestamp <= cutoff)
        {
            self.readings.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Check the structural invariants of a state loaded from storage
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(bad) = self
            .readings
            .iter()
            .find(|r| !r.value.is_finite() || r.value <= 0.0)
        {
            return Err(format!("reading value {} is not a positive number", bad.value));
        }

        let ordered = self
            .readings
            .iter()
            .zip(self.readings.iter().skip(1))
            .all(|(a, b)| a.timestamp < b.timestamp);
        if !ordered {
            return Err("readings are not in strictly ascending timestamp order".to_string());
        }

        if self.baseline_value.is_some_and(|b| !b.is_finite() || b <= 0.0) {
            return Err("baseline value is not a positive number".to_string());
        }

        if self.calibration_complete && self.baseline_value.is_none() {
            return Err("calibration complete without a baseline value".to_string());
        }

        if self.fixed_baseline_mode && !self.calibration_complete {
            return Err("baseline locked before calibration completed".to_string());
        }

        if self.fixed_baseline_mode != self.fixed_baseline_timestamp.is_some() {
            return Err("lock flag and lock timestamp disagree".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn state_with_readings(start: DateTime<Utc>, count: i64) -> BaselineState {
        let mut state = BaselineState::empty_at(start);
        for i in 0..count {
            state
                .readings
                .push_back(Reading::new(1000.0 + i as f64, start + Duration::minutes(i)));
        }
        state
    }

    #[test]
    fn test_empty_state() {
        let state = BaselineState::new();

        assert!(state.readings.is_empty());
        assert!(state.baseline_value.is_none());
        assert!(state.baseline_std.is_none());
        assert!(!state.calibration_complete);
        assert!(!state.fixed_baseline_mode);
        assert_eq!(state.phase(), CalibrationPhase::Collecting);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_phase_transitions() {
        let mut state = BaselineState::new();
        state.baseline_value = Some(1000.0);
        state.calibration_complete = true;
        assert_eq!(state.phase(), CalibrationPhase::Calibrated);

        state.fixed_baseline_mode = true;
        state.fixed_baseline_timestamp = Some(Utc::now());
        assert_eq!(state.phase(), CalibrationPhase::Locked);
    }

    #[test]
    fn test_prune_until() {
        let start = Utc::now();
        let mut state = state_with_readings(start, 10);

        let evicted = state.prune_until(start + Duration::minutes(3));

        assert_eq!(evicted, 4);
        assert_eq!(state.readings.len(), 6);
        assert_eq!(state.readings[0].timestamp, start + Duration::minutes(4));
    }

    #[test]
    fn test_prune_until_nothing_old() {
        let start = Utc::now();
        let mut state = state_with_readings(start, 5);

        assert_eq!(state.prune_until(start - Duration::hours(1)), 0);
        assert_eq!(state.readings.len(), 5);
    }

    #[test]
    fn test_invariants_reject_unordered_readings() {
        let start = Utc::now();
        let mut state = state_with_readings(start, 3);
        state.readings.swap(0, 2);

        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_reject_complete_without_baseline() {
        let mut state = BaselineState::new();
        state.calibration_complete = true;

        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_reject_lock_without_timestamp() {
        let mut state = BaselineState::new();
        state.baseline_value = Some(1000.0);
        state.calibration_complete = true;
        state.fixed_baseline_mode = true;

        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_serde_field_names() {
        let state = state_with_readings(Utc::now(), 1);
        let json = serde_json::to_value(&state).unwrap();

        assert!(json.get("readings").is_some());
        assert!(json.get("baseline_value").is_some());
        assert!(json.get("fixed_baseline_mode").is_some());
        assert!(json["readings"][0].get("temperature").is_none());
    }

    #[test]
    fn test_deserialize_minimal_document() {
        let json = r#"{"created": "2025-01-15T10:30:00Z"}"#;
        let state: BaselineState = serde_json::from_str(json).unwrap();

        assert!(state.readings.is_empty());
        assert!(state.baseline_value.is_none());
        assert!(!state.calibration_complete);
    }
}
