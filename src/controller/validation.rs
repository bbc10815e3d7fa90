//! Client-side input checks. A failure here means no request is sent.

use std::fmt;
use std::path::Path;

/// Why a form was rejected before any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingFile,
    NotCsv,
    MissingDate,
    InvalidPercentage,
    ZeroRevenue,
    EmptyMessage,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingFile => "Please select a CSV file.",
            Self::NotCsv => "Please upload a CSV file.",
            Self::MissingDate => "Please select both month and year.",
            Self::InvalidPercentage => "Please enter a valid percentage (0-100).",
            Self::ZeroRevenue => "Current Revenue is 0, no loss predicted.",
            Self::EmptyMessage => "Please type a message.",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ValidationError {}

/// Parse the current-revenue field.
///
/// Anything that is not a finite number greater than zero (empty text,
/// non-numeric, zero, negative, NaN, infinity) becomes `0.0`.
pub fn normalize_revenue(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Accept only an existing selection whose name ends in `.csv`.
///
/// The extension check is case-sensitive, like the upload form's.
pub fn validate_csv_path(path: Option<&Path>) -> Result<&Path, ValidationError> {
    let path = path.ok_or(ValidationError::MissingFile)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(ValidationError::MissingFile)?;
    if name.ends_with(".csv") {
        Ok(path)
    } else {
        Err(ValidationError::NotCsv)
    }
}

/// Both month and year must be filled in. Returns the trimmed values.
pub fn validate_date<'a>(month: &'a str, year: &'a str) -> Result<(&'a str, &'a str), ValidationError> {
    let (month, year) = (month.trim(), year.trim());
    if month.is_empty() || year.is_empty() {
        Err(ValidationError::MissingDate)
    } else {
        Ok((month, year))
    }
}

/// Churn reduction must be a number in `[0, 100]`.
pub fn validate_percentage(input: &str) -> Result<f64, ValidationError> {
    match input.trim().parse::<f64>() {
        Ok(pct) if pct.is_finite() && (0.0..=100.0).contains(&pct) => Ok(pct),
        _ => Err(ValidationError::InvalidPercentage),
    }
}

/// Chat input is sent trimmed and must not be empty.
pub fn validate_message(input: &str) -> Result<&str, ValidationError> {
    let message = input.trim();
    if message.is_empty() {
        Err(ValidationError::EmptyMessage)
    } else {
        Ok(message)
    }
}
