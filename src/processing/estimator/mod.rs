pub mod baseline;
pub mod vendor;

use serde::{Deserialize, Serialize};

use crate::error::AirQualityError;
use crate::processing::baseline::{BaselineConfig, BaselineEstimator, BaselineStore, ClassificationResult};
use crate::protocol::SensorSample;
use vendor::VendorAssessment;

/// Outcome of assessing one sensor sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Assessment {
    /// Relative score against the learned baseline
    Baseline(ClassificationResult),
    /// Pre-calibrated IAQ reported by the vendor algorithm
    Vendor(VendorAssessment),
}

impl Assessment {
    /// The baseline classification, present in both modes
    pub fn classification(&self) -> &ClassificationResult {
        match self {
            Assessment::Baseline(result) => result,
            Assessment::Vendor(vendor) => &vendor.baseline,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Assessment::Baseline(result) => result.air_quality_status.as_str(),
            Assessment::Vendor(vendor) => vendor.iaq_status.as_str(),
        }
    }

    pub fn calibration_complete(&self) -> bool {
        match self {
            Assessment::Baseline(result) => result.calibration_complete,
            Assessment::Vendor(vendor) => vendor.calibration_complete,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Assessment::Baseline(_) => "baseline",
            Assessment::Vendor(_) => "vendor",
        }
    }

    /// Numeric fields for the metrics exporter; absent values are skipped
    pub fn metric_fields(&self) -> Vec<(&'static str, f64)> {
        let result = self.classification();
        let mut fields: Vec<(&'static str, f64)> = [
            ("gas_resistance", Some(result.gas_resistance)),
            ("air_quality_score", result.air_quality_score),
            ("air_quality_percentage", result.air_quality_percentage),
            ("baseline_value", result.baseline_value),
            ("baseline_std", result.baseline_std),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect();

        if let Assessment::Vendor(vendor) = self {
            fields.push(("iaq", vendor.iaq));
            fields.push(("iaq_accuracy", vendor.iaq_accuracy.as_u8() as f64));
            fields.extend(
                [
                    ("static_iaq", vendor.static_iaq),
                    ("co2_equivalent", vendor.co2_equivalent),
                    ("breath_voc_equivalent", vendor.breath_voc_equivalent),
                ]
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
            );
        }

        fields
    }
}

/// Shared capability of every air quality estimator
pub trait AirQualityEstimator: Send + Sync {
    /// Score one sample
    fn assess(&mut self, sample: &SensorSample) -> Result<Assessment, AirQualityError>;

    /// Name of the estimator for logging/debugging
    fn name(&self) -> &'static str;

    /// Baseline state machine behind this estimator, if it has one
    fn baseline(&self) -> Option<&BaselineEstimator> {
        None
    }

    fn baseline_mut(&mut self) -> Option<&mut BaselineEstimator> {
        None
    }
}

/// Configuration for the estimator implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EstimatorMethod {
    /// Learned relative baseline
    #[default]
    Baseline,
    /// Vendor IAQ when the sensor bridge reports it, baseline otherwise
    Vendor,
}

impl EstimatorMethod {
    /// Create an estimator instance backed by the given store
    pub fn create(
        &self,
        config: BaselineConfig,
        store: Box<dyn BaselineStore>,
    ) -> Box<dyn AirQualityEstimator> {
        let baseline = BaselineEstimator::new(config, store);
        match self {
            EstimatorMethod::Baseline => Box::new(baseline),
            EstimatorMethod::Vendor => Box::new(vendor::VendorIaqEstimator::new(baseline)),
        }
    }
}
