use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Money, Multiple, Rate};
use crate::EngineResult;

/// Hard ceiling on the explicit forecast horizon. Keeps `(1+g)^t` inside the
/// 96-bit decimal mantissa for realistic cash flows.
pub const ABSOLUTE_MAX_DCF_YEARS: u32 = 100;

/// Engine assumptions that are not part of the company snapshot.
///
/// Every constant the calculators depend on lives here so that a result can
/// always be reproduced from `(input, config)` alone. The effective config is
/// echoed into the output envelope as `assumptions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Perpetuity growth after the explicit horizon (Gordon growth).
    /// Must stay below the discount rate.
    pub terminal_growth_rate: Rate,
    /// Upper bound accepted for `dcf_years`
    pub max_dcf_years: u32,
    pub normalization: NormalizationConfig,
    pub rating: RatingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            terminal_growth_rate: Decimal::ZERO,
            max_dcf_years: 50,
            normalization: NormalizationConfig::default(),
            rating: RatingConfig::default(),
        }
    }
}

/// Thousands-vs-millions detection heuristic for filing figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Magnitudes strictly above this are taken to be in a finer unit
    pub threshold: Money,
    /// Divisor applied to figures above the threshold
    pub divisor: Decimal,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            threshold: dec!(1_000_000),
            divisor: dec!(1_000),
        }
    }
}

/// Band thresholds for the rating synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatingConfig {
    /// Forecast PER strictly below this is "cheap"
    pub per_cheap: Multiple,
    /// Forecast PER strictly above this is "expensive"
    pub per_expensive: Multiple,
    /// PBR strictly below this trades below book
    pub pbr_cheap: Multiple,
    /// PBR strictly above this is "rich"
    pub pbr_expensive: Multiple,
    /// Net cash / market cap at or above this counts as strong asset backing
    pub net_cash_rich_ratio: Rate,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            per_cheap: dec!(10),
            per_expensive: dec!(20),
            pbr_cheap: dec!(1),
            pbr_expensive: dec!(2),
            net_cash_rich_ratio: dec!(0.3),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.terminal_growth_rate <= dec!(-1) {
            return Err(ValuationError::config(
                "terminal_growth_rate",
                "Terminal growth rate must be greater than -1",
            ));
        }
        if self.max_dcf_years == 0 || self.max_dcf_years > ABSOLUTE_MAX_DCF_YEARS {
            return Err(ValuationError::config(
                "max_dcf_years",
                format!("Must be between 1 and {ABSOLUTE_MAX_DCF_YEARS}"),
            ));
        }
        self.normalization.validate()?;
        self.rating.validate()
    }
}

impl NormalizationConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.threshold <= Decimal::ZERO {
            return Err(ValuationError::config(
                "normalization.threshold",
                "Threshold must be positive",
            ));
        }
        if self.divisor <= Decimal::ONE {
            return Err(ValuationError::config(
                "normalization.divisor",
                "Divisor must be greater than 1",
            ));
        }
        Ok(())
    }
}

impl RatingConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.per_cheap <= Decimal::ZERO || self.per_cheap > self.per_expensive {
            return Err(ValuationError::config(
                "rating.per_cheap",
                "PER bands require 0 < per_cheap <= per_expensive",
            ));
        }
        if self.pbr_cheap <= Decimal::ZERO || self.pbr_cheap > self.pbr_expensive {
            return Err(ValuationError::config(
                "rating.pbr_cheap",
                "PBR bands require 0 < pbr_cheap <= pbr_expensive",
            ));
        }
        if self.net_cash_rich_ratio <= Decimal::ZERO {
            return Err(ValuationError::config(
                "rating.net_cash_rich_ratio",
                "Ratio must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "terminal_growth_rate": "0.01", "rating": { "per_cheap": 8 } }"#)
                .unwrap();
        assert_eq!(cfg.terminal_growth_rate, dec!(0.01));
        assert_eq!(cfg.rating.per_cheap, dec!(8));
        assert_eq!(cfg.rating.per_expensive, dec!(20));
        assert_eq!(cfg.normalization, NormalizationConfig::default());
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let res: Result<EngineConfig, _> = serde_json::from_str(r#"{ "terminal_growth": 0.01 }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.rating.per_cheap = dec!(25);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ValuationError::InvalidConfig { ref field, .. } if field == "rating.per_cheap"));
    }

    #[test]
    fn test_horizon_ceiling() {
        let cfg = EngineConfig {
            max_dcf_years: ABSOLUTE_MAX_DCF_YEARS + 1,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
