use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DataSource, log_non_sample};
use crate::error::AirQualityError;
use crate::protocol::{SensorSample, parse_line};

/// Data source for a sensor bridge printing one sample line per reading
pub struct SerialDataSource {
    port_name: String,
    baud_rate: u32,
    is_active: Arc<AtomicBool>,
    reader_task: Option<JoinHandle<()>>,
}

impl SerialDataSource {
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            is_active: Arc::new(AtomicBool::new(false)),
            reader_task: None,
        }
    }

    /// List available serial ports (helper for CLI)
    pub fn list_available_ports() -> Result<Vec<serialport::SerialPortInfo>, AirQualityError> {
        serialport::available_ports().map_err(AirQualityError::SerialPort)
    }
}

#[async_trait]
impl DataSource for SerialDataSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SensorSample>, AirQualityError> {
        let port = serialport::new(&self.port_name, self.baud_rate)
            .timeout(Duration::from_millis(500))
            .open()?;

        let (sample_tx, sample_rx) = mpsc::channel(32);

        self.is_active.store(true, Ordering::SeqCst);
        let is_active = self.is_active.clone();
        let port_name = self.port_name.clone();

        // Spawn blocking reader task
        let reader_handle = tokio::task::spawn_blocking(move || {
            let mut reader = BufReader::new(port);
            let mut line_buf = String::new();

            tracing::info!("Serial reader started on {}", port_name);

            while is_active.load(Ordering::SeqCst) {
                line_buf.clear();
                match reader.read_line(&mut line_buf) {
                    Ok(0) => continue,
                    Ok(_) => {
                        let parsed = parse_line(&line_buf);
                        log_non_sample(&parsed);
                        if let Some(sample) = parsed.into_sample(Utc::now()) {
                            if sample_tx.blocking_send(sample).is_err() {
                                tracing::warn!("Sample receiver dropped, stopping reader");
                                break;
                            }
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        continue;
                    }
                    Err(e) => {
                        tracing::error!("Serial read error: {}", e);
                        break;
                    }
                }
            }

            is_active.store(false, Ordering::SeqCst);
            tracing::info!("Serial reader stopped");
        });

        self.reader_task = Some(reader_handle);

        Ok(sample_rx)
    }

    async fn stop(&mut self) -> Result<(), AirQualityError> {
        self.is_active.store(false, Ordering::SeqCst);

        if let Some(handle) = self.reader_task.take() {
            let _ = handle.await;
        }

        tracing::info!("Serial data source stopped");

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_data_source_creation() {
        let source = SerialDataSource::new("/dev/ttyACM0".to_string(), 115200);
        assert_eq!(source.port_name, "/dev/ttyACM0");
        assert_eq!(source.baud_rate, 115200);
        assert!(!source.is_active());
    }

    #[tokio::test]
    async fn test_start_on_missing_port_fails() {
        let mut source = SerialDataSource::new("/dev/does-not-exist-aq".to_string(), 115200);

        assert!(source.start().await.is_err());
        assert!(!source.is_active());
    }

    #[test]
    fn test_list_ports_doesnt_panic() {
        let _ = SerialDataSource::list_available_ports();
    }
}
