use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::input::ValuationInput;
use crate::normalize::NormalizedFinancials;
use crate::types::{Metric, Money, Rate};
use crate::EngineResult;

/// Operating return on the capital tied up in the business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityMetrics {
    /// Operating profit after tax
    pub nopat: Money,
    /// Net assets less net cash
    pub invested_capital: Money,
    /// NOPAT / invested capital, as a percentage
    pub roic_pct: Metric,
}

pub fn calculate_profitability(
    input: &ValuationInput,
    financials: &NormalizedFinancials,
) -> EngineResult<ProfitabilityMetrics> {
    let nopat = nopat(financials.operating_profit, input.effective_tax_rate);
    let invested_capital = invested_capital(financials.net_assets, financials.net_cash)?;
    let roic_pct =
        Metric::ratio(nopat, invested_capital, "Invested capital is not positive").percent();

    Ok(ProfitabilityMetrics {
        nopat,
        invested_capital,
        roic_pct,
    })
}

pub fn nopat(operating_profit: Money, tax_rate: Rate) -> Money {
    operating_profit * (Decimal::ONE - tax_rate)
}

/// Cash held beyond debt is not operating capital.
pub fn invested_capital(net_assets: Money, net_cash: Money) -> EngineResult<Money> {
    net_assets
        .checked_sub(net_cash)
        .ok_or_else(|| ValuationError::out_of_range("net_assets", "Invested capital"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_roic_components() {
        // NOPAT = 7,800 x 0.7 = 5,460; IC = 62,918 - 5,486 = 57,432; ROIC = 9.51%
        let n = nopat(dec!(7800), dec!(0.30));
        assert_eq!(n, dec!(5460));
        let ic = invested_capital(dec!(62918), dec!(5486)).unwrap();
        assert_eq!(ic, dec!(57432));
        let roic = Metric::ratio(n, ic, "n/a").percent();
        assert_eq!(roic.value().unwrap().round_dp(2), dec!(9.51));
    }

    #[test]
    fn test_cash_rich_balance_sheet_has_no_roic() {
        // Net cash above net assets leaves no operating capital to measure against.
        let ic = invested_capital(dec!(17965), dec!(20000)).unwrap();
        assert!(!Metric::ratio(dec!(840), ic, "n/a").is_applicable());
    }

    #[test]
    fn test_invested_capital_overflow_names_net_assets() {
        let err = invested_capital(Decimal::MAX, -Decimal::MAX).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { ref field, .. } if field == "net_assets"));
    }
}
