pub mod classifier;
pub mod estimator;
pub mod state;
pub mod store;

pub use classifier::{AirQualityStatus, ClassificationResult, ReadingClassifier};
pub use estimator::{BaselineConfig, BaselineEstimator, BaselineInfo, Stability};
pub use state::{BaselineState, CalibrationPhase, Reading};
pub use store::{BaselineStore, JsonFileStore, MemoryStore};
