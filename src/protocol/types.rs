use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Calibration accuracy reported by the vendor IAQ algorithm (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum IaqAccuracy {
    #[default]
    Unreliable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl IaqAccuracy {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            IaqAccuracy::Unreliable => "Unreliable",
            IaqAccuracy::Low => "Low Accuracy",
            IaqAccuracy::Medium => "Medium Accuracy",
            IaqAccuracy::High => "High Accuracy",
        }
    }
}

impl TryFrom<u8> for IaqAccuracy {
    type Error = SensorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IaqAccuracy::Unreliable),
            1 => Ok(IaqAccuracy::Low),
            2 => Ok(IaqAccuracy::Medium),
            3 => Ok(IaqAccuracy::High),
            _ => Err(SensorError::InvalidAccuracy(value)),
        }
    }
}

/// Output of a vendor IAQ algorithm running on the sensor bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorOutput {
    pub iaq: f64,
    pub accuracy: IaqAccuracy,
    pub static_iaq: Option<f64>,
    pub co2_equivalent: Option<f64>,
    pub breath_voc_equivalent: Option<f64>,
}

/// One environmental sample from the sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// Ohms
    pub gas_resistance: f64,
    pub vendor: Option<VendorOutput>,
}

impl SensorSample {
    pub fn new(temperature: f64, humidity: f64, pressure: f64, gas_resistance: f64) -> Self {
        Self::with_timestamp(Utc::now(), temperature, humidity, pressure, gas_resistance)
    }

    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        pressure: f64,
        gas_resistance: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            pressure,
            gas_resistance,
            vendor: None,
        }
    }

    pub fn with_vendor(mut self, vendor: VendorOutput) -> Self {
        self.vendor = Some(vendor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_try_from_valid() {
        assert_eq!(IaqAccuracy::try_from(0).unwrap(), IaqAccuracy::Unreliable);
        assert_eq!(IaqAccuracy::try_from(3).unwrap(), IaqAccuracy::High);
    }

    #[test]
    fn test_accuracy_try_from_invalid() {
        assert!(IaqAccuracy::try_from(4).is_err());
        assert!(IaqAccuracy::try_from(255).is_err());
    }

    #[test]
    fn test_accuracy_labels() {
        assert_eq!(IaqAccuracy::Unreliable.label(), "Unreliable");
        assert_eq!(IaqAccuracy::Medium.label(), "Medium Accuracy");
        assert_eq!(IaqAccuracy::High.as_u8(), 3);
    }

    #[test]
    fn test_sample_with_vendor() {
        let sample = SensorSample::new(21.5, 40.0, 1013.2, 120_000.0);
        assert!(sample.vendor.is_none());

        let sample = sample.with_vendor(VendorOutput {
            iaq: 42.0,
            accuracy: IaqAccuracy::Low,
            static_iaq: None,
            co2_equivalent: Some(500.0),
            breath_voc_equivalent: None,
        });
        assert_eq!(sample.vendor.as_ref().map(|v| v.iaq), Some(42.0));
    }
}
