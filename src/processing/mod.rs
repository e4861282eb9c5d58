pub mod baseline;
pub mod estimator;
pub mod statistics;
pub mod validation;
