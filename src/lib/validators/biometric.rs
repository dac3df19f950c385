use crate::error::ValidationError;

const ORIGIN: &str = "validate_biometric";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biometric {
    /// kilograms
    Weight,
    /// meters
    Height,
}

impl Biometric {
    fn max(&self) -> f64 {
        match self {
            Biometric::Weight => 300.0,
            Biometric::Height => 3.0,
        }
    }
}

/// Parses a decimal that may use a comma separator and range checks it.
pub fn validate_biometric(value: &str, kind: Biometric) -> Result<f64, ValidationError> {
    let raw = value.trim();
    let parsed = raw
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ValidationError::new(ORIGIN, format!("Value '{}' is not a valid number", raw))
        })?;

    if parsed < 0.0 || parsed > kind.max() {
        return Err(ValidationError::new(
            ORIGIN,
            format!("Value {} must be between 0 and {}", parsed, kind.max()),
        ));
    }

    Ok(parsed)
}
