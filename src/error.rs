use thiserror::Error;

/// Main error type for the air quality service
#[derive(Error, Debug)]
pub enum AirQualityError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("Sensor protocol error: {0}")]
    Sensor(#[from] SensorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics export error: {0}")]
    Metrics(String),
}

/// Errors raised while decoding lines from the sensor bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Missing field {0} in sensor line")]
    MissingField(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid IAQ accuracy: {0}. Must be 0-3")]
    InvalidAccuracy(u8),

    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_error_display() {
        let err = SensorError::MissingField("G");
        assert!(err.to_string().contains("Missing field G"));

        let err = SensorError::InvalidAccuracy(7);
        assert!(err.to_string().contains("Invalid IAQ accuracy: 7"));
    }

    #[test]
    fn test_air_quality_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AirQualityError = io_err.into();
        assert!(matches!(err, AirQualityError::Io(_)));
    }

    #[test]
    fn test_air_quality_error_from_sensor() {
        let err: AirQualityError = SensorError::MissingField("T").into();
        assert!(matches!(err, AirQualityError::Sensor(_)));
    }

    #[test]
    fn test_invalid_reading_error() {
        let err = AirQualityError::InvalidReading("gas resistance must be positive".to_string());
        assert!(err.to_string().contains("gas resistance must be positive"));
    }
}
