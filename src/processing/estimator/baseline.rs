use super::{AirQualityEstimator, Assessment};
use crate::error::AirQualityError;
use crate::processing::baseline::{BaselineEstimator, Reading};
use crate::protocol::SensorSample;

impl AirQualityEstimator for BaselineEstimator {
    fn assess(&mut self, sample: &SensorSample) -> Result<Assessment, AirQualityError> {
        let reading = Reading::new(sample.gas_resistance, sample.timestamp)
            .with_environment(Some(sample.temperature), Some(sample.humidity));

        self.ingest_reading(reading).map(Assessment::Baseline)
    }

    fn name(&self) -> &'static str {
        "Baseline"
    }

    fn baseline(&self) -> Option<&BaselineEstimator> {
        Some(self)
    }

    fn baseline_mut(&mut self) -> Option<&mut BaselineEstimator> {
        Some(self)
    }
}
