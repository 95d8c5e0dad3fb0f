use napi::Result as NapiResult;
use napi_derive::napi;

use equity_val_core::{parse_document, EngineConfig, ValuationError};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Core errors keep their kind as the napi status so callers can branch
/// on validation failures vs divergent scenarios.
fn valuation_error(e: ValuationError) -> napi::Error {
    let status = if e.is_validation() {
        napi::Status::InvalidArg
    } else {
        napi::Status::GenericFailure
    };
    napi::Error::new(status, e.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<EngineConfig, ValuationError> {
    let config = match config_json {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(&json).map_err(|e| {
            ValuationError::InvalidConfig {
                field: "config".into(),
                reason: e.to_string(),
            }
        })?,
        _ => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let document = parse_document(&input_json).map_err(valuation_error)?;
    let config = parse_config(config_json).map_err(valuation_error)?;
    let output = equity_val_core::evaluate_value(document, &config).map_err(valuation_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_config() -> NapiResult<String> {
    serde_json::to_string(&EngineConfig::default()).map_err(to_napi_error)
}
