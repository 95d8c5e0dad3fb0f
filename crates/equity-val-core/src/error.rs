use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuationError {
    /// Malformed or out-of-range input. Raised before any computation runs.
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A DCF scenario whose growth rate is not strictly below the discount rate.
    /// The perpetuity sum does not converge, so the whole evaluation fails.
    #[error("Divergent DCF scenario '{scenario}': discount rate ({discount_rate}) must exceed growth rate ({growth_rate})")]
    DivergentScenario {
        scenario: String,
        growth_rate: Decimal,
        discount_rate: Decimal,
    },

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ValuationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValuationError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Arithmetic on `field` left the 96-bit decimal range.
    pub(crate) fn out_of_range(field: &str, what: &str) -> Self {
        ValuationError::InvalidInput {
            field: field.to_string(),
            reason: format!("{what} exceeds the decimal range"),
        }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        ValuationError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's document or configuration.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ValuationError::InvalidInput { .. } | ValuationError::InvalidConfig { .. }
        )
    }
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::SerializationError(e.to_string())
    }
}
