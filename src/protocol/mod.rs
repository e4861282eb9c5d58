pub mod parser;
pub mod types;

pub use parser::{ParsedLine, parse_line};
pub use types::{IaqAccuracy, SensorSample, VendorOutput};
