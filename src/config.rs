use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data_source::DataSourceConfig;
use crate::processing::baseline::BaselineConfig;
use crate::processing::estimator::EstimatorMethod;

#[derive(Parser, Debug)]
#[command(name = "air-quality-service")]
#[command(about = "BME680 Adaptive Air Quality Baseline Service")]
#[command(version)]
pub struct Cli {
    /// HTTP server port
    #[arg(short, long, default_value = "8100")]
    pub listen: u16,

    /// HTTP server host
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Baseline persistence file
    #[arg(long, env = "AQ_BASELINE_FILE", default_value = "/tmp/bme680_baseline.json")]
    pub baseline_file: PathBuf,

    /// Keep baseline state in memory only
    #[arg(long)]
    pub no_persist: bool,

    /// Readings required before a baseline is computed
    #[arg(long, default_value = "2880")]
    pub min_readings: usize,

    /// Rolling window length while calibrating
    #[arg(long, default_value = "72")]
    pub window_hours: i64,

    /// Retention while the baseline is locked
    #[arg(long, default_value = "24")]
    pub locked_window_hours: i64,

    /// Maximum std/baseline ratio for a stable window
    #[arg(long, default_value = "0.2")]
    pub stability_ratio: f64,

    /// Air quality estimator
    #[arg(long, value_enum, default_value = "baseline")]
    pub estimator: EstimatorArg,

    /// Device label used in metrics and device info
    #[arg(long, env = "DEVICE_ID", default_value = "pi4_bme680")]
    pub device_id: String,

    /// VictoriaMetrics base URL (e.g., http://localhost:8428)
    #[arg(long, env = "VM_URL")]
    pub metrics_url: Option<String>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Read the sensor bridge on a serial port
    Serial(SerialArgs),

    /// Playback from log file
    Playback(PlaybackArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SerialArgs {
    /// Serial port device path (e.g., COM3 on Windows, /dev/ttyUSB0 on Linux)
    #[arg(short, long)]
    pub device: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    pub baud: u32,
}

#[derive(Args, Debug, Clone)]
pub struct PlaybackArgs {
    /// Path to log file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Playback speed multiplier (1.0 = real-time, 2.0 = 2x speed)
    #[arg(short, long, default_value = "1.0")]
    pub speed: f64,

    /// Loop playback when file ends
    #[arg(long, default_value = "false")]
    pub loop_playback: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum EstimatorArg {
    /// Learned relative baseline (default)
    #[default]
    Baseline,
    /// Vendor IAQ when reported, baseline otherwise
    Vendor,
}

impl Cli {
    /// Convert CLI args to DataSourceConfig
    pub fn to_data_source_config(&self) -> Option<DataSourceConfig> {
        match &self.mode {
            Some(Mode::Serial(args)) => Some(DataSourceConfig::Serial {
                port: args.device.clone(),
                baud_rate: args.baud,
            }),
            Some(Mode::Playback(args)) => Some(DataSourceConfig::Playback {
                log_file: args.file.clone(),
                speed_multiplier: args.speed,
                loop_playback: args.loop_playback,
            }),
            None => None,
        }
    }

    /// Convert CLI args to EstimatorMethod
    pub fn to_estimator_method(&self) -> EstimatorMethod {
        match self.estimator {
            EstimatorArg::Baseline => EstimatorMethod::Baseline,
            EstimatorArg::Vendor => EstimatorMethod::Vendor,
        }
    }

    /// Convert CLI args to BaselineConfig
    pub fn to_baseline_config(&self) -> BaselineConfig {
        BaselineConfig {
            min_readings_for_baseline: self.min_readings,
            window_hours: self.window_hours,
            locked_window_hours: self.locked_window_hours,
            stability_ratio: self.stability_ratio,
            ..BaselineConfig::default()
        }
    }
}
