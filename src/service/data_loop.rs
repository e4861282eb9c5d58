use tokio::sync::mpsc;

use crate::error::AirQualityError;
use crate::monitoring::MetricsClient;
use crate::processing::estimator::Assessment;
use crate::protocol::SensorSample;
use crate::service::state::SharedState;

/// Readings between calibration progress log lines
const PROGRESS_LOG_INTERVAL: u64 = 10;

/// Background data processing loop
pub struct DataProcessingLoop {
    state: SharedState,
    metrics_client: Option<MetricsClient>,
}

impl DataProcessingLoop {
    pub fn new(state: SharedState, metrics_client: Option<MetricsClient>) -> Self {
        Self {
            state,
            metrics_client,
        }
    }

    /// Run the processing loop, receiving samples from the channel
    pub async fn run(
        &self,
        mut sample_rx: mpsc::Receiver<SensorSample>,
    ) -> Result<(), AirQualityError> {
        tracing::info!("Data processing loop started");

        while let Some(sample) = sample_rx.recv().await {
            let Some(assessment) = self.process_sample(&sample).await else {
                continue;
            };

            self.push_metrics(&assessment, &sample).await;
        }

        tracing::info!("Data processing loop finished");
        Ok(())
    }

    /// Assess one sample and record it as the latest reading
    async fn process_sample(&self, sample: &SensorSample) -> Option<Assessment> {
        let mut state = self.state.write().await;

        let assessment = match state.estimator.assess(sample) {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::warn!("Skipping sample: {}", e);
                return None;
            }
        };

        let was_complete = state
            .latest
            .as_ref()
            .is_some_and(Assessment::calibration_complete);

        state.readings_processed += 1;
        state.latest = Some(assessment.clone());

        if assessment.calibration_complete() {
            if !was_complete {
                tracing::info!(
                    "{} estimator calibrated after {} readings",
                    state.estimator.name(),
                    state.readings_processed
                );
            }
        } else if state.readings_processed % PROGRESS_LOG_INTERVAL == 0 {
            let result = assessment.classification();
            tracing::info!(
                "Calibrating: {} readings in window, {}",
                result.total_readings,
                result.description
            );
        }

        tracing::debug!(
            "Assessed ({}): gas={:.0} Ω, status={}, score={:?}",
            assessment.mode(),
            sample.gas_resistance,
            assessment.status_label(),
            assessment.classification().air_quality_score
        );

        Some(assessment)
    }

    /// Push an assessed sample to the metrics endpoint if one is configured
    async fn push_metrics(&self, assessment: &Assessment, sample: &SensorSample) {
        let Some(client) = &self.metrics_client else {
            return;
        };

        let (metrics_url, device_id) = {
            let state = self.state.read().await;
            (state.metrics_url.clone(), state.device_id.clone())
        };

        let Some(metrics_url) = metrics_url else {
            tracing::trace!("No metrics URL - skipping push");
            return;
        };

        if let Err(e) = client
            .push(&metrics_url, &device_id, assessment, sample)
            .await
        {
            tracing::error!("Failed to push metrics: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::service::state::test_state;

    fn samples(count: i64, gas: f64) -> Vec<SensorSample> {
        let start = Utc::now();
        (0..count)
            .map(|i| {
                SensorSample::with_timestamp(
                    start + Duration::seconds(30 * i),
                    21.0,
                    40.0,
                    1013.0,
                    gas,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_process_sample_records_latest() {
        let state = test_state(3);
        let loop_processor = DataProcessingLoop::new(state.clone(), None);

        let assessment = loop_processor
            .process_sample(&SensorSample::new(21.0, 40.0, 1013.0, 1000.0))
            .await
            .unwrap();

        assert!(!assessment.calibration_complete());

        let state = state.read().await;
        assert_eq!(state.readings_processed, 1);
        assert_eq!(state.latest, Some(assessment));
    }

    #[tokio::test]
    async fn test_process_sample_skips_invalid() {
        let state = test_state(3);
        let loop_processor = DataProcessingLoop::new(state.clone(), None);

        let result = loop_processor
            .process_sample(&SensorSample::new(21.0, 40.0, 1013.0, -5.0))
            .await;

        assert!(result.is_none());

        let state = state.read().await;
        assert_eq!(state.readings_processed, 0);
        assert!(state.latest.is_none());
    }

    #[tokio::test]
    async fn test_run_until_channel_closes() {
        let state = test_state(3);
        let loop_processor = DataProcessingLoop::new(state.clone(), None);
        let (tx, rx) = mpsc::channel(8);

        for sample in samples(4, 1000.0) {
            tx.send(sample).await.unwrap();
        }
        drop(tx);

        loop_processor.run(rx).await.unwrap();

        let state = state.read().await;
        assert_eq!(state.readings_processed, 4);
        let latest = state.latest.as_ref().unwrap();
        assert!(latest.calibration_complete());
        assert_eq!(latest.classification().baseline_value, Some(1000.0));
    }

    #[tokio::test]
    async fn test_window_ahead_of_clock_does_not_stall_processing() {
        let state = test_state(3);
        let loop_processor = DataProcessingLoop::new(state.clone(), None);

        // Window recorded by a clock running 200 hours ahead
        for mut sample in samples(3, 1000.0) {
            sample.timestamp += Duration::hours(200);
            assert!(loop_processor.process_sample(&sample).await.is_some());
        }

        for sample in samples(2, 1000.0) {
            let assessment = loop_processor.process_sample(&sample).await.unwrap();
            assert_eq!(assessment.classification().baseline_value, Some(1000.0));
        }

        assert_eq!(state.read().await.readings_processed, 5);
    }

    #[tokio::test]
    async fn test_unreachable_metrics_endpoint_is_not_fatal() {
        let state = test_state(3);
        state.write().await.metrics_url = Some("http://127.0.0.1:1".to_string());
        let loop_processor = DataProcessingLoop::new(state.clone(), MetricsClient::new().ok());
        let (tx, rx) = mpsc::channel(8);

        for sample in samples(2, 1000.0) {
            tx.send(sample).await.unwrap();
        }
        drop(tx);

        assert!(loop_processor.run(rx).await.is_ok());
        assert_eq!(state.read().await.readings_processed, 2);
    }
}
