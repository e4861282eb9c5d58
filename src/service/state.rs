use std::sync::Arc;

use tokio::sync::RwLock;

use crate::processing::estimator::{AirQualityEstimator, Assessment};

/// Application state for the air quality service
pub struct ServiceState {
    pub device_id: String,
    /// VictoriaMetrics base URL; metrics are not pushed when unset
    pub metrics_url: Option<String>,

    pub estimator: Box<dyn AirQualityEstimator>,

    // Latest processed data
    pub latest: Option<Assessment>,
    pub readings_processed: u64,
}

impl ServiceState {
    pub fn new(
        device_id: String,
        metrics_url: Option<String>,
        estimator: Box<dyn AirQualityEstimator>,
    ) -> Self {
        Self {
            device_id,
            metrics_url,
            estimator,
            latest: None,
            readings_processed: 0,
        }
    }

    /// Check if readings should be pushed to the metrics endpoint
    pub fn is_exporting(&self) -> bool {
        self.metrics_url.is_some()
    }
}

/// Thread-safe shared state
pub type SharedState = Arc<RwLock<ServiceState>>;

/// Create a new shared state instance
pub fn create_shared_state(
    device_id: String,
    metrics_url: Option<String>,
    estimator: Box<dyn AirQualityEstimator>,
) -> SharedState {
    Arc::new(RwLock::new(ServiceState::new(
        device_id,
        metrics_url,
        estimator,
    )))
}

#[cfg(test)]
pub(crate) fn test_state(min_readings: usize) -> SharedState {
    use crate::processing::baseline::{BaselineConfig, MemoryStore};
    use crate::processing::estimator::EstimatorMethod;

    let config = BaselineConfig {
        min_readings_for_baseline: min_readings,
        ..BaselineConfig::default()
    };
    let estimator = EstimatorMethod::Baseline.create(config, Box::new(MemoryStore::new()));
    create_shared_state("test_device".to_string(), None, estimator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SensorSample;

    #[test]
    fn test_service_state_new() {
        let state = test_state(3);
        let state = state.try_read().unwrap();

        assert_eq!(state.device_id, "test_device");
        assert!(state.latest.is_none());
        assert_eq!(state.readings_processed, 0);
        assert!(!state.is_exporting());
        assert_eq!(state.estimator.name(), "Baseline");
    }

    #[tokio::test]
    async fn test_shared_state() {
        let state = test_state(3);

        // Write
        {
            let mut s = state.write().await;
            let assessment = s
                .estimator
                .assess(&SensorSample::new(21.0, 40.0, 1013.0, 1000.0))
                .unwrap();
            s.latest = Some(assessment);
            s.metrics_url = Some("http://localhost:8428".to_string());
        }

        // Read
        {
            let s = state.read().await;
            assert!(s.latest.is_some());
            assert!(s.is_exporting());
            assert_eq!(s.estimator.baseline().unwrap().state().readings.len(), 1);
        }
    }
}
