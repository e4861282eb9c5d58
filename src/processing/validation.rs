/// Reading validator
///
/// Rejects samples that would corrupt the percentile and deviation statistics
/// of the baseline window: gas resistance must be finite and positive.
pub struct ReadingValidator;

impl ReadingValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw reading before it enters the window
    ///
    /// Returns Ok(()) if valid, Err with description if invalid
    pub fn validate(
        &self,
        gas_resistance: f64,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> Result<(), String> {
        if !gas_resistance.is_finite() {
            return Err(format!(
                "gas resistance ({}) must be a finite number",
                gas_resistance
            ));
        }

        if gas_resistance <= 0.0 {
            return Err(format!(
                "gas resistance ({:.2}) must be greater than zero",
                gas_resistance
            ));
        }

        if let Some(t) = temperature.filter(|t| !t.is_finite()) {
            return Err(format!("temperature ({}) must be a finite number", t));
        }

        if let Some(h) = humidity.filter(|h| !h.is_finite()) {
            return Err(format!("humidity ({}) must be a finite number", h));
        }

        Ok(())
    }
}

impl Default for ReadingValidator {
    fn default() -> Self {
        Self::new()
    }
}
