//! Field validators.
//!
//! Every validator takes the raw text of one form field and returns either
//! the normalized value or a [`ValidationError`] naming the validator. The
//! storage-backed checks in [`identity`] can also fail with a database error,
//! which is why they return the crate-wide [`Error`](crate::error::Error).

use crate::error::ValidationError;

pub mod biometric;
pub mod date;
pub mod identity;
pub mod password;

pub use biometric::{validate_biometric, Biometric};
pub use date::{validate_date, DateFormat};
pub use identity::{validate_email, validate_username};
pub use password::{hash_password, validate_password, verify_password};

/// Fails on the first empty value. Fields are `(label, value)` pairs.
pub fn validate_fields(fields: &[(&str, &str)]) -> Result<(), ValidationError> {
    for (label, value) in fields {
        if value.is_empty() {
            return Err(ValidationError::new(
                "validate_fields",
                format!("Field \"{}\" cannot be null", label),
            ));
        }
    }

    Ok(())
}

/// Names may hold letters, digits and spaces only.
pub fn validate_name(label: &str, value: &str) -> Result<String, ValidationError> {
    let name = value.trim();
    let mut compact = name.chars().filter(|c| *c != ' ').peekable();

    if compact.peek().is_none() || !compact.all(char::is_alphanumeric) {
        return Err(ValidationError::new(
            "validate_name",
            format!("Value entered in the {} field is not valid", label),
        ));
    }

    Ok(name.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
        }
    }
}

pub fn validate_gender(value: &str) -> Result<Gender, ValidationError> {
    match value.trim() {
        "F" => Ok(Gender::Female),
        "M" => Ok(Gender::Male),
        other => Err(ValidationError::new(
            "validate_gender",
            format!("Invalid gender: {}", other),
        )),
    }
}
