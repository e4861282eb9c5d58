pub mod air_quality;
pub mod baseline;
pub mod device;
