pub mod playback;
pub mod serial;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AirQualityError;
use crate::protocol::{ParsedLine, SensorSample};

/// Trait for abstracting data sources (real hardware vs playback)
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Start the data source and return a channel receiver for sensor samples
    async fn start(&mut self) -> Result<mpsc::Receiver<SensorSample>, AirQualityError>;

    /// Stop the data source
    async fn stop(&mut self) -> Result<(), AirQualityError>;

    /// Check if data source is active
    fn is_active(&self) -> bool;

    /// Get the name of this data source for logging
    fn name(&self) -> &str;
}

/// Configuration for creating data sources
#[derive(Debug, Clone)]
pub enum DataSourceConfig {
    /// Sensor bridge on a serial port
    Serial { port: String, baud_rate: u32 },
    /// Log file playback
    Playback {
        log_file: PathBuf,
        speed_multiplier: f64,
        loop_playback: bool,
    },
}

impl DataSourceConfig {
    /// Create a data source from this configuration
    pub fn create_source(&self) -> Box<dyn DataSource> {
        match self {
            DataSourceConfig::Serial { port, baud_rate } => {
                Box::new(serial::SerialDataSource::new(port.clone(), *baud_rate))
            }
            DataSourceConfig::Playback {
                log_file,
                speed_multiplier,
                loop_playback,
            } => Box::new(playback::PlaybackDataSource::new(
                log_file.clone(),
                *speed_multiplier,
                *loop_playback,
            )),
        }
    }
}

/// Log the lines that do not produce a sample
///
/// A sensor fault only means there is no reading this cycle.
pub(crate) fn log_non_sample(line: &ParsedLine) {
    match line {
        ParsedLine::Error(msg) => tracing::warn!("Sensor reported fault: {}", msg),
        ParsedLine::Invalid(e) => tracing::warn!("Discarding malformed sensor line: {}", e),
        ParsedLine::Unknown(text) if !text.is_empty() => {
            tracing::debug!("Ignoring unrecognized line: {}", text)
        }
        _ => {}
    }
}
