use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Metric, PerShare};

/// Where the price sits relative to liquidation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationPosition {
    /// Price above liquidation value
    Premium,
    /// Price below liquidation value: an asset-backed margin of safety
    Discount,
    AtValue,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationCheck {
    pub liquidation_value_per_share: PerShare,
    /// (price - liquidation value) / liquidation value x 100.
    /// Positive is a premium, negative a discount.
    pub discount_pct: Metric,
    pub position: LiquidationPosition,
}

pub fn check_liquidation(stock_price: PerShare, liquidation_value_per_share: PerShare) -> LiquidationCheck {
    let discount_pct = Metric::ratio(
        stock_price - liquidation_value_per_share,
        liquidation_value_per_share,
        "Liquidation value per share is zero",
    )
    .percent();

    let position = match discount_pct.value() {
        None => LiquidationPosition::NotApplicable,
        Some(pct) if pct > Decimal::ZERO => LiquidationPosition::Premium,
        Some(pct) if pct < Decimal::ZERO => LiquidationPosition::Discount,
        Some(_) => LiquidationPosition::AtValue,
    };

    LiquidationCheck {
        liquidation_value_per_share,
        discount_pct,
        position,
    }
}
