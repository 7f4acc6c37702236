//! Error types for the advisor library

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("product '{0}' is not in the catalog")]
    MissingProduct(String),

    #[error("product '{0}' cannot cover its assigned nutrient")]
    InvalidProduct(String),

    #[error("invalid fertilizer grade: {0}")]
    InvalidGrade(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Reject negative, NaN and infinite values
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AdvisorError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AdvisorError::InvalidInput(format!(
            "{} must be greater than zero, got {}",
            name, value
        )));
    }
    Ok(())
}
