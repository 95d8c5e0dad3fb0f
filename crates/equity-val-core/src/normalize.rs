//! Unit normalization for entity-level filing figures.
//!
//! Filings mix reporting granularities: the same document may give revenue
//! in millions and net cash in thousands. The heuristic lives here and only
//! here. A magnitude above `threshold` is taken to be in thousands and
//! divided by `divisor`, field by field. Everything downstream sees one unit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::NormalizationConfig;
use crate::error::ValuationError;
use crate::input::ValuationInput;
use crate::types::Money;
use crate::EngineResult;

/// Base currency units per million.
pub const UNITS_PER_MILLION: Decimal = dec!(1_000_000);

/// Express a reported figure in millions of the base currency.
///
/// Values whose magnitude is at or below the threshold pass through
/// unchanged, so normalizing an already-normalized figure is a no-op.
pub fn normalize_to_millions(value: Money, config: &NormalizationConfig) -> Money {
    if value.abs() > config.threshold {
        value / config.divisor
    } else {
        value
    }
}

/// Entity-level figures after normalization, in base currency units, plus
/// the raw share count.
///
/// Conversion from millions happens once, in [`NormalizedFinancials::from_input`],
/// so market capitalization (price x shares) and statement figures can be
/// combined without unit juggling in the calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFinancials {
    pub revenue: Money,
    pub operating_profit: Money,
    pub net_income: Money,
    pub operating_cf: Money,
    pub fcf: Money,
    pub net_cash: Money,
    pub ebitda: Money,
    pub net_assets: Money,
    /// Raw share count (never thousands)
    pub shares: Decimal,
    /// Fields the heuristic rescaled from thousands
    pub rescaled_fields: Vec<String>,
}

impl NormalizedFinancials {
    pub fn from_input(input: &ValuationInput, config: &NormalizationConfig) -> EngineResult<Self> {
        let mut rescaled_fields = Vec::new();
        let mut to_units = |field: &str, raw: Money| -> EngineResult<Money> {
            let millions = normalize_to_millions(raw, config);
            if millions != raw {
                tracing::debug!(field, %raw, %millions, "rescaled filing figure from thousands");
                rescaled_fields.push(field.to_string());
            }
            millions
                .checked_mul(UNITS_PER_MILLION)
                .ok_or_else(|| ValuationError::out_of_range(field, "Value in base currency units"))
        };

        let revenue = to_units("revenue", input.revenue)?;
        let operating_profit = to_units("operating_profit", input.operating_profit)?;
        let net_income = to_units("net_income", input.net_income)?;
        let operating_cf = to_units("operating_cf", input.operating_cf)?;
        let fcf = to_units("fcf", input.fcf)?;
        let net_cash = to_units("net_cash", input.net_cash)?;
        let ebitda = to_units("ebitda", input.ebitda)?;
        let net_assets = to_units("net_assets", input.net_assets)?;

        Ok(Self {
            revenue,
            operating_profit,
            net_income,
            operating_cf,
            fcf,
            net_cash,
            ebitda,
            net_assets,
            shares: input.raw_shares(),
            rescaled_fields,
        })
    }

    /// Net debt is the mirror of net cash.
    pub fn net_debt(&self) -> Money {
        -self.net_cash
    }
}
