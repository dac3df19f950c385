use crate::error::ValidationError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const ORIGIN: &str = "validate_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// day, month, year
    #[default]
    UK,
    /// month, day, year
    US,
    /// year, month, day
    ISO,
}

impl DateFormat {
    pub fn new(s: &str) -> Result<DateFormat, ValidationError> {
        match s.to_ascii_uppercase().as_str() {
            "UK" => Ok(DateFormat::UK),
            "US" => Ok(DateFormat::US),
            "ISO" => Ok(DateFormat::ISO),
            _ => Err(ValidationError::new(ORIGIN, "Invalid date format")),
        }
    }
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{2,4})[/-]?([0-9]{2})[/-]?([0-9]{2,4})$").expect("valid date pattern")
    })
}

pub fn validate_date(value: &str, format: DateFormat) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::new(ORIGIN, "Invalid date string");

    let captures = date_pattern().captures(value.trim()).ok_or_else(invalid)?;
    let mut parts = [0u32; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        *part = captures[i + 1].parse().map_err(|_| invalid())?;
    }

    let (day, month, year) = match format {
        DateFormat::UK => (parts[0], parts[1], parts[2]),
        DateFormat::US => (parts[1], parts[0], parts[2]),
        DateFormat::ISO => (parts[2], parts[1], parts[0]),
    };

    if year < 1 {
        return Err(ValidationError::new(
            ORIGIN,
            format!("year {} is out of range", year),
        ));
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::new(ORIGIN, "month must be in 1..12"));
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| ValidationError::new(ORIGIN, "day is out of range for month"))
}
