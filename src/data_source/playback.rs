use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

use super::{DataSource, log_non_sample};
use crate::error::{AirQualityError, SensorError};
use crate::protocol::{SensorSample, parse_line};

// ISO8601 timestamp at start of line, with optional timezone (Z or +HH:MM)
static TIMESTAMPED_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?)\s+(.*)$")
        .unwrap()
});

/// A line from the log file with its timestamp
#[derive(Debug, Clone)]
struct TimestampedLine {
    timestamp: DateTime<Utc>,
    content: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SensorError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Without timezone, assume UTC
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|ndt| ndt.and_utc()))
        .map_err(|_| SensorError::InvalidTimestamp(raw.to_string()))
}

/// Data source replaying a recorded sensor log, paced by its timestamps
pub struct PlaybackDataSource {
    log_file: PathBuf,
    speed_multiplier: f64,
    loop_playback: bool,
    is_active: Arc<AtomicBool>,
    reader_task: Option<JoinHandle<()>>,
}

impl PlaybackDataSource {
    pub fn new(log_file: PathBuf, speed_multiplier: f64, loop_playback: bool) -> Self {
        Self {
            log_file,
            speed_multiplier: speed_multiplier.max(0.1), // Minimum 0.1x speed
            loop_playback,
            is_active: Arc::new(AtomicBool::new(false)),
            reader_task: None,
        }
    }

    /// Parse a timestamped line from the log file
    /// Format: "2025-01-15T10:30:00.123 T=21.5 H=40.1 P=1013.2 G=123456"
    fn parse_timestamped_line(line: &str) -> Option<TimestampedLine> {
        let caps = TIMESTAMPED_LINE_REGEX.captures(line.trim())?;
        let timestamp = parse_timestamp(caps.get(1)?.as_str()).ok()?;
        let content = caps.get(2)?.as_str();

        Some(TimestampedLine {
            timestamp,
            content: content.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for PlaybackDataSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SensorSample>, AirQualityError> {
        // Fail early if the file is missing
        File::open(&self.log_file).await?;

        let (sample_tx, sample_rx) = mpsc::channel(32);

        self.is_active.store(true, Ordering::SeqCst);
        let is_active = self.is_active.clone();
        let speed_multiplier = self.speed_multiplier;
        let loop_playback = self.loop_playback;
        let log_file = self.log_file.clone();

        let reader_handle = tokio::spawn(async move {
            tracing::info!(
                "Playback started from {:?} at {}x speed",
                log_file,
                speed_multiplier
            );

            // Looped passes are shifted forward so timestamps keep increasing
            let mut pass_offset = chrono::Duration::zero();

            loop {
                let file = match File::open(&log_file).await {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::error!("Failed to open log file: {}", e);
                        break;
                    }
                };

                let mut lines = BufReader::new(file).lines();
                let playback_start = std::time::Instant::now();
                let mut log_start: Option<DateTime<Utc>> = None;
                let mut last_timestamp: Option<DateTime<Utc>> = None;

                while is_active.load(Ordering::SeqCst) {
                    let line = match lines.next_line().await {
                        Ok(Some(line)) => line,
                        Ok(None) => break, // End of file
                        Err(e) => {
                            tracing::error!("Error reading log file: {}", e);
                            break;
                        }
                    };

                    let Some(timestamped) = Self::parse_timestamped_line(&line) else {
                        continue;
                    };

                    let log_start_time = *log_start.get_or_insert(timestamped.timestamp);

                    // Wait until the recorded offset, scaled by the speed multiplier
                    let log_elapsed =
                        (timestamped.timestamp - log_start_time).num_milliseconds() as f64;
                    let target_elapsed_ms = log_elapsed / speed_multiplier;
                    let actual_elapsed_ms = playback_start.elapsed().as_millis() as f64;
                    let wait_ms = target_elapsed_ms - actual_elapsed_ms;
                    if wait_ms > 0.0 {
                        sleep(Duration::from_millis(wait_ms as u64)).await;
                    }

                    last_timestamp = Some(timestamped.timestamp);

                    let parsed = parse_line(&timestamped.content);
                    log_non_sample(&parsed);
                    if let Some(sample) = parsed.into_sample(timestamped.timestamp + pass_offset) {
                        if sample_tx.send(sample).await.is_err() {
                            tracing::warn!("Sample receiver dropped, stopping playback");
                            return;
                        }
                    }
                }

                if !loop_playback || !is_active.load(Ordering::SeqCst) {
                    break;
                }

                if let (Some(first), Some(last)) = (log_start, last_timestamp) {
                    pass_offset += (last - first) + chrono::Duration::seconds(1);
                }

                tracing::info!("Looping playback from start");
            }

            is_active.store(false, Ordering::SeqCst);
            tracing::info!("Playback finished");
        });

        self.reader_task = Some(reader_handle);

        Ok(sample_rx)
    }

    async fn stop(&mut self) -> Result<(), AirQualityError> {
        self.is_active.store(false, Ordering::SeqCst);

        if let Some(handle) = self.reader_task.take() {
            handle.abort();
            let _ = handle.await;
        }

        tracing::info!("Playback data source stopped");

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        self.log_file.to_str().unwrap_or("playback")
    }
}
