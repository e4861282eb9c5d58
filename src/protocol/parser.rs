use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::types::{IaqAccuracy, SensorSample, VendorOutput};
use crate::error::SensorError;

static FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*)=(\S+)$").unwrap());

/// Sensor values decoded from one bridge line, not yet timestamped
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReadout {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
    pub vendor: Option<VendorOutput>,
}

impl SensorReadout {
    /// Stamp the readout with the time it was received or recorded
    pub fn at(self, timestamp: DateTime<Utc>) -> SensorSample {
        SensorSample {
            timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            gas_resistance: self.gas_resistance,
            vendor: self.vendor,
        }
    }
}

/// Parsed line variants from the sensor bridge
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// T=.. H=.. P=.. G=.. [IAQ=.. ACC=.. SIAQ=.. CO2=.. VOC=..]
    Sample(SensorReadout),
    /// Sample line with a missing or malformed field
    Invalid(SensorError),
    /// Sensor fault reported by the bridge
    Error(String),
    /// `#` comment
    Comment,
    /// Unrecognized line
    Unknown(String),
}

impl ParsedLine {
    /// Timestamp a sample line; every other variant yields nothing
    pub fn into_sample(self, timestamp: DateTime<Utc>) -> Option<SensorSample> {
        match self {
            ParsedLine::Sample(readout) => Some(readout.at(timestamp)),
            _ => None,
        }
    }
}

fn field(fields: &HashMap<String, &str>, key: &'static str) -> Result<f64, SensorError> {
    let raw = fields.get(key).ok_or(SensorError::MissingField(key))?;
    optional_field(fields, key)?.ok_or_else(|| SensorError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn optional_field(fields: &HashMap<String, &str>, key: &str) -> Result<Option<f64>, SensorError> {
    match fields.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| SensorError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            }),
    }
}

fn parse_vendor(fields: &HashMap<String, &str>) -> Result<Option<VendorOutput>, SensorError> {
    let Some(iaq) = optional_field(fields, "IAQ")? else {
        return Ok(None);
    };

    let accuracy = match fields.get("ACC") {
        None => IaqAccuracy::Unreliable,
        Some(raw) => {
            let value = raw.parse::<u8>().map_err(|_| SensorError::InvalidValue {
                key: "ACC".to_string(),
                value: raw.to_string(),
            })?;
            IaqAccuracy::try_from(value)?
        }
    };

    Ok(Some(VendorOutput {
        iaq,
        accuracy,
        static_iaq: optional_field(fields, "SIAQ")?,
        co2_equivalent: optional_field(fields, "CO2")?,
        breath_voc_equivalent: optional_field(fields, "VOC")?,
    }))
}

fn parse_readout(fields: &HashMap<String, &str>) -> Result<SensorReadout, SensorError> {
    Ok(SensorReadout {
        temperature: field(fields, "T")?,
        humidity: field(fields, "H")?,
        pressure: field(fields, "P")?,
        gas_resistance: field(fields, "G")?,
        vendor: parse_vendor(fields)?,
    })
}

/// Parse a single line from the sensor bridge
pub fn parse_line(input: &str) -> ParsedLine {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return ParsedLine::Unknown(String::new());
    }

    if trimmed.starts_with('#') {
        return ParsedLine::Comment;
    }

    // ERROR <message>
    if let Some(msg) = trimmed.strip_prefix("ERROR ") {
        return ParsedLine::Error(msg.trim().to_string());
    }

    let mut fields = HashMap::new();
    for token in trimmed.split_whitespace() {
        let Some(caps) = FIELD_REGEX.captures(token) else {
            return ParsedLine::Unknown(trimmed.to_string());
        };
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            return ParsedLine::Unknown(trimmed.to_string());
        };
        fields.insert(key.as_str().to_ascii_uppercase(), value.as_str());
    }

    match parse_readout(&fields) {
        Ok(readout) => ParsedLine::Sample(readout),
        Err(e) => ParsedLine::Invalid(e),
    }
}
