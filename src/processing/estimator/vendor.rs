use serde::{Deserialize, Serialize};

use super::{AirQualityEstimator, Assessment};
use crate::error::AirQualityError;
use crate::processing::baseline::{BaselineEstimator, ClassificationResult};
use crate::protocol::{IaqAccuracy, SensorSample};

/// IAQ index bands (0-500 scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IaqStatus {
    Excellent,
    Good,
    #[serde(rename = "Lightly Polluted")]
    LightlyPolluted,
    #[serde(rename = "Moderately Polluted")]
    ModeratelyPolluted,
    #[serde(rename = "Heavily Polluted")]
    HeavilyPolluted,
    #[serde(rename = "Severely Polluted")]
    SeverelyPolluted,
    #[serde(rename = "Extremely Polluted")]
    ExtremelyPolluted,
}

impl IaqStatus {
    pub fn from_iaq(iaq: f64) -> Self {
        if iaq <= 50.0 {
            IaqStatus::Excellent
        } else if iaq <= 100.0 {
            IaqStatus::Good
        } else if iaq <= 150.0 {
            IaqStatus::LightlyPolluted
        } else if iaq <= 200.0 {
            IaqStatus::ModeratelyPolluted
        } else if iaq <= 250.0 {
            IaqStatus::HeavilyPolluted
        } else if iaq <= 350.0 {
            IaqStatus::SeverelyPolluted
        } else {
            IaqStatus::ExtremelyPolluted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IaqStatus::Excellent => "Excellent",
            IaqStatus::Good => "Good",
            IaqStatus::LightlyPolluted => "Lightly Polluted",
            IaqStatus::ModeratelyPolluted => "Moderately Polluted",
            IaqStatus::HeavilyPolluted => "Heavily Polluted",
            IaqStatus::SeverelyPolluted => "Severely Polluted",
            IaqStatus::ExtremelyPolluted => "Extremely Polluted",
        }
    }
}

/// Vendor IAQ output together with the baseline view of the same sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorAssessment {
    pub iaq: f64,
    pub iaq_accuracy: IaqAccuracy,
    pub accuracy_status: String,
    pub iaq_status: IaqStatus,
    pub static_iaq: Option<f64>,
    pub co2_equivalent: Option<f64>,
    pub breath_voc_equivalent: Option<f64>,
    /// Vendor algorithm has left its unreliable warm-up phase
    pub calibration_complete: bool,
    pub baseline: ClassificationResult,
}

/// Prefers the vendor IAQ reported by the sensor bridge
///
/// Every sample still goes through the baseline estimator so its window stays
/// continuous; samples without vendor output are reported from the baseline.
pub struct VendorIaqEstimator {
    baseline: BaselineEstimator,
}

impl VendorIaqEstimator {
    pub fn new(baseline: BaselineEstimator) -> Self {
        Self { baseline }
    }
}

impl AirQualityEstimator for VendorIaqEstimator {
    fn assess(&mut self, sample: &SensorSample) -> Result<Assessment, AirQualityError> {
        let baseline = self.baseline.assess(sample)?.classification().clone();

        let Some(vendor) = &sample.vendor else {
            tracing::trace!("No vendor output in sample, using baseline result");
            return Ok(Assessment::Baseline(baseline));
        };

        Ok(Assessment::Vendor(VendorAssessment {
            iaq: vendor.iaq,
            iaq_accuracy: vendor.accuracy,
            accuracy_status: vendor.accuracy.label().to_string(),
            iaq_status: IaqStatus::from_iaq(vendor.iaq),
            static_iaq: vendor.static_iaq,
            co2_equivalent: vendor.co2_equivalent,
            breath_voc_equivalent: vendor.breath_voc_equivalent,
            calibration_complete: vendor.accuracy >= IaqAccuracy::Low,
            baseline,
        }))
    }

    fn name(&self) -> &'static str {
        "Vendor IAQ"
    }

    fn baseline(&self) -> Option<&BaselineEstimator> {
        Some(&self.baseline)
    }

    fn baseline_mut(&mut self) -> Option<&mut BaselineEstimator> {
        Some(&mut self.baseline)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::processing::baseline::{BaselineConfig, MemoryStore};
    use crate::protocol::VendorOutput;

    fn estimator() -> VendorIaqEstimator {
        let config = BaselineConfig {
            min_readings_for_baseline: 3,
            ..BaselineConfig::default()
        };
        VendorIaqEstimator::new(BaselineEstimator::new(config, Box::new(MemoryStore::new())))
    }

    fn vendor_output(iaq: f64, accuracy: IaqAccuracy) -> VendorOutput {
        VendorOutput {
            iaq,
            accuracy,
            static_iaq: None,
            co2_equivalent: Some(550.0),
            breath_voc_equivalent: Some(0.6),
        }
    }

    #[test]
    fn test_iaq_status_bands() {
        assert_eq!(IaqStatus::from_iaq(0.0), IaqStatus::Excellent);
        assert_eq!(IaqStatus::from_iaq(50.0), IaqStatus::Excellent);
        assert_eq!(IaqStatus::from_iaq(50.1), IaqStatus::Good);
        assert_eq!(IaqStatus::from_iaq(150.0), IaqStatus::LightlyPolluted);
        assert_eq!(IaqStatus::from_iaq(200.0), IaqStatus::ModeratelyPolluted);
        assert_eq!(IaqStatus::from_iaq(250.0), IaqStatus::HeavilyPolluted);
        assert_eq!(IaqStatus::from_iaq(350.0), IaqStatus::SeverelyPolluted);
        assert_eq!(IaqStatus::from_iaq(420.0), IaqStatus::ExtremelyPolluted);
    }

    #[test]
    fn test_vendor_output_is_preferred() {
        let mut estimator = estimator();
        let sample = SensorSample::new(21.0, 40.0, 1013.0, 1000.0)
            .with_vendor(vendor_output(120.0, IaqAccuracy::High));

        let Assessment::Vendor(vendor) = estimator.assess(&sample).unwrap() else {
            panic!("Expected vendor assessment");
        };

        assert_eq!(vendor.iaq_status, IaqStatus::LightlyPolluted);
        assert_eq!(vendor.accuracy_status, "High Accuracy");
        assert!(vendor.calibration_complete);
        assert_eq!(vendor.baseline.total_readings, 1);
    }

    #[test]
    fn test_unreliable_accuracy_is_not_calibrated() {
        let mut estimator = estimator();
        let sample = SensorSample::new(21.0, 40.0, 1013.0, 1000.0)
            .with_vendor(vendor_output(25.0, IaqAccuracy::Unreliable));

        let assessment = estimator.assess(&sample).unwrap();

        assert!(!assessment.calibration_complete());
        assert_eq!(assessment.status_label(), "Excellent");
    }

    #[test]
    fn test_falls_back_to_baseline_without_vendor_output() {
        let mut estimator = estimator();
        let start = Utc::now();

        for i in 0..3 {
            let sample = SensorSample::with_timestamp(
                start + Duration::seconds(30 * i),
                21.0,
                40.0,
                1013.0,
                1000.0,
            );
            let assessment = estimator.assess(&sample).unwrap();
            assert!(matches!(assessment, Assessment::Baseline(_)));
        }

        let baseline = estimator.baseline().unwrap();
        assert_eq!(baseline.state().baseline_value, Some(1000.0));
    }

    #[test]
    fn test_admin_operations_reach_inner_baseline() {
        let mut estimator = estimator();

        assert!(!estimator.baseline_mut().unwrap().lock());
        assert_eq!(estimator.baseline().unwrap().state().readings.len(), 0);
    }
}
