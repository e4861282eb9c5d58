use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{ClassificationResult, ReadingClassifier};
use super::state::{BaselineState, CalibrationPhase, Reading};
use super::store::BaselineStore;
use crate::error::AirQualityError;
use crate::processing::statistics::{WindowStats, percentile, population_std_dev};
use crate::processing::validation::ReadingValidator;

/// Tuning for the adaptive baseline
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    /// Window size required before a baseline is computed (24h at a 30s cadence)
    pub min_readings_for_baseline: usize,
    /// Retention while the baseline is rolling
    pub window_hours: i64,
    /// Retention while the baseline is locked, kept for diagnostics only
    pub locked_window_hours: i64,
    /// Window is stable when std < baseline * ratio
    pub stability_ratio: f64,
    pub baseline_percentile: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            min_readings_for_baseline: 2880,
            window_hours: 72,
            locked_window_hours: 24,
            stability_ratio: 0.2,
            baseline_percentile: 75.0,
        }
    }
}

impl BaselineConfig {
    pub fn validate(&self) -> Result<(), AirQualityError> {
        if self.min_readings_for_baseline == 0 {
            return Err(AirQualityError::Config(
                "min readings for baseline must be at least 1".into(),
            ));
        }
        if self.window_hours <= 0 || self.locked_window_hours <= 0 {
            return Err(AirQualityError::Config(
                "retention windows must be positive".into(),
            ));
        }
        if !(self.stability_ratio > 0.0) {
            return Err(AirQualityError::Config(
                "stability ratio must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.baseline_percentile) {
            return Err(AirQualityError::Config(
                "baseline percentile must be within 0-100".into(),
            ));
        }
        Ok(())
    }

    fn retention(&self, locked: bool) -> Duration {
        if locked {
            Duration::hours(self.locked_window_hours)
        } else {
            Duration::hours(self.window_hours)
        }
    }
}

/// How settled the window looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stability {
    Fixed,
    Stable,
    Variable,
}

/// Read-only diagnostics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineInfo {
    pub baseline_value: Option<f64>,
    pub baseline_std: Option<f64>,
    pub readings_count: usize,
    pub min_readings_for_baseline: usize,
    pub calibration_complete: bool,
    pub fixed_baseline_mode: bool,
    pub fixed_baseline_timestamp: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub phase: CalibrationPhase,
    pub stability: Stability,
    pub current_stats: Option<WindowStats>,
}

/// Adaptive baseline estimator and calibration state machine
///
/// Owns the reading window and persists it through the injected store after
/// every accepted reading and every administrative transition.
pub struct BaselineEstimator {
    config: BaselineConfig,
    state: BaselineState,
    store: Box<dyn BaselineStore>,
    classifier: ReadingClassifier,
    validator: ReadingValidator,
}

impl BaselineEstimator {
    /// Create an estimator, restoring whatever the store holds
    pub fn new(config: BaselineConfig, store: Box<dyn BaselineStore>) -> Self {
        let state = store.load();
        Self {
            classifier: ReadingClassifier::new(config.min_readings_for_baseline),
            validator: ReadingValidator::new(),
            config,
            state,
            store,
        }
    }

    pub fn state(&self) -> &BaselineState {
        &self.state
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.state.phase()
    }

    /// Ingest a reading taken now
    pub fn ingest(
        &mut self,
        gas_resistance: f64,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> Result<ClassificationResult, AirQualityError> {
        let reading =
            Reading::new(gas_resistance, Utc::now()).with_environment(temperature, humidity);
        self.ingest_reading(reading)
    }

    /// Ingest a reading carrying its own timestamp
    pub fn ingest_reading(
        &mut self,
        reading: Reading,
    ) -> Result<ClassificationResult, AirQualityError> {
        self.validator
            .validate(reading.value, reading.temperature, reading.humidity)
            .map_err(AirQualityError::InvalidReading)?;

        if let Some(newest) = self.state.newest_timestamp() {
            if reading.timestamp <= newest {
                let horizon = self.config.retention(self.state.fixed_baseline_mode);
                if newest - reading.timestamp <= horizon {
                    return Err(AirQualityError::InvalidReading(format!(
                        "timestamp {} is not after the newest reading {}",
                        reading.timestamp, newest
                    )));
                }

                // Clock jumped back past the whole window: restart the window, keep the baseline
                tracing::warn!(
                    "Reading at {} predates the window (newest {}), discarding {} readings",
                    reading.timestamp,
                    newest,
                    self.state.readings.len()
                );
                self.state.readings.clear();
            }
        }

        let was_complete = self.state.calibration_complete;
        let baseline_updated = self.update_window(reading.clone());

        if self.state.calibration_complete && !was_complete {
            tracing::info!(
                "Calibration complete: baseline {:.0} ohm from {} readings",
                self.state.baseline_value.unwrap_or_default(),
                self.state.readings.len()
            );
        }

        let result = self
            .classifier
            .classify(&reading, &self.state)
            .with_baseline_updated(baseline_updated);

        self.store.save(&self.state);

        Ok(result)
    }

    /// Append, prune and conditionally recompute; returns whether the baseline changed
    fn update_window(&mut self, reading: Reading) -> bool {
        let now = reading.timestamp;
        self.state.readings.push_back(reading);

        let cutoff = now - self.config.retention(self.state.fixed_baseline_mode);
        let evicted = self.state.prune_until(cutoff);
        if evicted > 0 {
            tracing::trace!("Pruned {} readings older than {}", evicted, cutoff);
        }

        if self.state.fixed_baseline_mode {
            return false;
        }

        if self.state.readings.len() < self.config.min_readings_for_baseline {
            return false;
        }

        let values = self.state.values();
        let (Some(candidate), Some(std_dev)) = (
            percentile(&values, self.config.baseline_percentile),
            population_std_dev(&values),
        ) else {
            return false;
        };

        if std_dev < candidate * self.config.stability_ratio {
            self.state.calibration_complete = true;
        }

        if self.state.baseline_value == Some(candidate) {
            return false;
        }

        tracing::debug!(
            "Baseline updated: {:?} -> {:.1} (std {:.1})",
            self.state.baseline_value,
            candidate,
            std_dev
        );

        self.state.baseline_value = Some(candidate);
        self.state.baseline_std = Some(std_dev);
        self.state.last_updated = Some(now);
        true
    }

    /// Freeze the baseline; fails without one
    pub fn lock(&mut self) -> bool {
        let Some(baseline) = self.state.baseline_value else {
            tracing::warn!("Cannot lock baseline: no baseline has been established yet");
            return false;
        };

        self.state.fixed_baseline_mode = true;
        self.state.calibration_complete = true;
        self.state.fixed_baseline_timestamp = Some(Utc::now());
        self.store.save(&self.state);

        tracing::info!("Baseline locked at {:.0} ohm", baseline);
        true
    }

    /// Resume recomputation from the retained window
    pub fn unlock(&mut self) {
        self.state.fixed_baseline_mode = false;
        self.state.fixed_baseline_timestamp = None;
        self.store.save(&self.state);

        tracing::info!(
            "Baseline unlocked, {} readings retained",
            self.state.readings.len()
        );
    }

    /// Discard the window and all derived fields
    pub fn reset(&mut self) {
        self.state = BaselineState::new();
        self.store.save(&self.state);

        tracing::info!("Baseline calibration reset");
    }

    /// Mark calibration complete without locking; requires a baseline
    pub fn force_complete(&mut self) -> bool {
        if self.state.baseline_value.is_none() {
            tracing::warn!("Cannot force calibration complete: no baseline has been established yet");
            return false;
        }

        self.state.calibration_complete = true;
        self.store.save(&self.state);

        tracing::info!("Calibration marked complete");
        true
    }

    pub fn baseline_info(&self) -> BaselineInfo {
        let current_stats = WindowStats::from_values(&self.state.values());

        BaselineInfo {
            baseline_value: self.state.baseline_value,
            baseline_std: self.state.baseline_std,
            readings_count: self.state.readings.len(),
            min_readings_for_baseline: self.config.min_readings_for_baseline,
            calibration_complete: self.state.calibration_complete,
            fixed_baseline_mode: self.state.fixed_baseline_mode,
            fixed_baseline_timestamp: self.state.fixed_baseline_timestamp,
            last_updated: self.state.last_updated,
            created: self.state.created,
            phase: self.state.phase(),
            stability: self.stability(current_stats.as_ref()),
            current_stats,
        }
    }

    fn stability(&self, stats: Option<&WindowStats>) -> Stability {
        if self.state.fixed_baseline_mode {
            return Stability::Fixed;
        }

        let Some(stats) = stats else {
            return Stability::Variable;
        };

        let reference = self.state.baseline_value.unwrap_or(stats.mean);
        if stats.std_dev < reference * self.config.stability_ratio {
            Stability::Stable
        } else {
            Stability::Variable
        }
    }
}
