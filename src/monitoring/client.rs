use std::fmt::Write;
use std::time::Duration;

use reqwest::Client;

use crate::error::AirQualityError;
use crate::processing::estimator::Assessment;
use crate::protocol::SensorSample;

/// HTTP client pushing readings to a VictoriaMetrics import endpoint
pub struct MetricsClient {
    client: Client,
}

impl MetricsClient {
    pub fn new() -> Result<Self, AirQualityError> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        Ok(Self { client })
    }

    /// Sensor label distinguishing raw baseline scoring from vendor output
    pub fn sensor_label(assessment: &Assessment) -> &'static str {
        match assessment {
            Assessment::Baseline(_) => "bme680",
            Assessment::Vendor(_) => "bme680_bsec",
        }
    }

    /// Render one Prometheus text line per field, timestamped in milliseconds
    pub fn format_lines(device_id: &str, assessment: &Assessment, sample: &SensorSample) -> String {
        let sensor = Self::sensor_label(assessment);
        let timestamp_ms = sample.timestamp.timestamp_millis();

        let mut fields = vec![
            ("temperature", sample.temperature),
            ("humidity", sample.humidity),
            ("pressure", sample.pressure),
        ];
        fields.extend(assessment.metric_fields());

        let mut body = String::new();
        for (name, value) in fields {
            if !value.is_finite() {
                continue;
            }
            let _ = writeln!(
                body,
                "{}{{device=\"{}\",sensor=\"{}\"}} {} {}",
                name, device_id, sensor, value, timestamp_ms
            );
        }
        body
    }

    /// Push one assessed sample
    pub async fn push(
        &self,
        base_url: &str,
        device_id: &str,
        assessment: &Assessment,
        sample: &SensorSample,
    ) -> Result<(), AirQualityError> {
        let url = format!(
            "{}/api/v1/import/prometheus",
            base_url.trim_end_matches('/')
        );
        let body = Self::format_lines(device_id, assessment, sample);

        let response = self.client.post(&url).body(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Metrics import rejected: {} - {}", status, text);
            return Err(AirQualityError::Metrics(format!(
                "Metrics endpoint returned {}",
                status
            )));
        }

        tracing::debug!("Pushed metrics to {}", url);
        Ok(())
    }
}
