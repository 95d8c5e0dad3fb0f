use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::input::ValuationInput;
use crate::normalize::NormalizedFinancials;
use crate::types::{Metric, Money, Percent, PerShare};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Price multiples and the enterprise bridge, at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMultiples {
    /// Price / trailing EPS
    pub per_actual: Metric,
    /// Price / forecast EPS
    pub per_forecast: Metric,
    /// Price / book value per share
    pub pbr: Metric,
    /// Annual dividend / price, as a percentage
    pub dividend_yield_pct: Percent,
    /// Price / free cash flow per share
    pub pcfr: Metric,
    /// Market cap / revenue
    pub psr: Metric,
    /// Market cap / operating cash flow
    pub pcr: Metric,
    /// Forecast PER x PBR
    pub per_x_pbr: Metric,
    pub fcf_per_share: PerShare,
    pub market_cap: Money,
    pub net_debt: Money,
    pub enterprise_value: Money,
    pub ev_ebitda: Metric,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_multiples(
    input: &ValuationInput,
    financials: &NormalizedFinancials,
) -> EngineResult<MarketMultiples> {
    let price = input.stock_price;
    let market_cap = market_cap(price, financials.shares)?;
    let net_debt = financials.net_debt();
    let enterprise_value = enterprise_value(market_cap, net_debt)?;

    let per_actual = price_to_earnings(price, input.eps_actual, "Trailing EPS is not positive");
    let per_forecast =
        price_to_earnings(price, input.eps_forecast, "Forecast EPS is not positive");
    let pbr = price_to_book(price, input.bps);
    let per_x_pbr = match (per_forecast.value(), pbr.value()) {
        (Some(per), Some(pb)) => per.checked_mul(pb).map_or_else(
            || Metric::NotApplicable("PER x PBR exceeds the decimal range".into()),
            Metric::Value,
        ),
        _ => Metric::NotApplicable("Requires both forecast PER and PBR".into()),
    };

    Ok(MarketMultiples {
        per_actual,
        per_forecast,
        pbr,
        dividend_yield_pct: dividend_yield_pct(input.dividend_annual, price)?,
        pcfr: price_to_fcf(price, financials.fcf, financials.shares),
        psr: Metric::ratio(market_cap, financials.revenue, "Revenue is not positive"),
        pcr: Metric::ratio(
            market_cap,
            financials.operating_cf,
            "Operating cash flow is not positive",
        ),
        per_x_pbr,
        fcf_per_share: financials.fcf / financials.shares,
        market_cap,
        net_debt,
        enterprise_value,
        ev_ebitda: ev_to_ebitda(enterprise_value, financials.ebitda),
    })
}

/// PER; not applicable when EPS is zero or negative.
pub fn price_to_earnings(price: PerShare, eps: PerShare, reason: &str) -> Metric {
    Metric::ratio(price, eps, reason)
}

/// PBR; not applicable when book value per share is zero or negative.
pub fn price_to_book(price: PerShare, bps: PerShare) -> Metric {
    Metric::ratio(price, bps, "Book value per share is not positive")
}

/// Dividend yield in percent. Price is validated positive upstream.
pub fn dividend_yield_pct(dividend: PerShare, price: PerShare) -> EngineResult<Percent> {
    dividend
        .checked_div(price)
        .and_then(|y| y.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| ValuationError::out_of_range("dividend_annual", "Dividend yield"))
}

/// PCFR against free cash flow per share.
pub fn price_to_fcf(price: PerShare, fcf: Money, shares: Decimal) -> Metric {
    if fcf <= Decimal::ZERO {
        return Metric::NotApplicable("Free cash flow is not positive".into());
    }
    Metric::ratio(price, fcf / shares, "Free cash flow is not positive")
}

/// Price x raw share count.
pub fn market_cap(price: PerShare, shares: Decimal) -> EngineResult<Money> {
    price
        .checked_mul(shares)
        .ok_or_else(|| ValuationError::out_of_range("stock_price", "Market capitalization"))
}

pub fn enterprise_value(market_cap: Money, net_debt: Money) -> EngineResult<Money> {
    market_cap
        .checked_add(net_debt)
        .ok_or_else(|| ValuationError::out_of_range("net_cash", "Enterprise value"))
}

pub fn ev_to_ebitda(enterprise_value: Money, ebitda: Money) -> Metric {
    Metric::ratio(enterprise_value, ebitda, "EBITDA is not positive")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_per_and_pbr() {
        let per = price_to_earnings(dec!(1250), dec!(95), "n/a").value().unwrap();
        assert_eq!(per.round_dp(2), dec!(13.16));
        let pbr = price_to_book(dec!(1250), dec!(1100)).value().unwrap();
        assert_eq!(pbr.round_dp(2), dec!(1.14));
    }

    #[test]
    fn test_per_not_applicable_for_losses() {
        for eps in [Decimal::ZERO, dec!(-12.4)] {
            let per = price_to_earnings(dec!(1250), eps, "Forecast EPS is not positive");
            assert_eq!(per, Metric::NotApplicable("Forecast EPS is not positive".into()));
        }
    }

    #[test]
    fn test_pbr_not_applicable_for_negative_book() {
        assert!(!price_to_book(dec!(500), dec!(-30)).is_applicable());
    }

    #[test]
    fn test_dividend_yield() {
        // 65 / 1668 = 3.897%
        let y = dividend_yield_pct(dec!(65), dec!(1668)).unwrap();
        assert_eq!(y.round_dp(2), dec!(3.90));
    }

    #[test]
    fn test_market_cap_uses_raw_share_count() {
        assert_eq!(market_cap(dec!(1250), dec!(9_000_000)).unwrap(), dec!(11_250_000_000));
    }

    #[test]
    fn test_market_cap_overflow_names_price() {
        // 1e20 per share x 1.8e22 shares is beyond 96 bits
        let price = dec!(100_000_000_000_000_000_000);
        let shares = dec!(18_000_000_000_000_000_000_000);
        let err = market_cap(price, shares).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { ref field, .. } if field == "stock_price"));
    }

    #[test]
    fn test_dividend_yield_overflow_is_an_error() {
        let err = dividend_yield_pct(dec!(1_000_000), Decimal::new(1, 28)).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { ref field, .. } if field == "dividend_annual"));
    }

    #[test]
    fn test_enterprise_value_bridge() {
        // Net cash of 5,486m lowers EV; net debt raises it.
        let mcap = market_cap(dec!(1668), dec!(33_794_000)).unwrap();
        let ev = enterprise_value(mcap, dec!(-5_486_000_000)).unwrap();
        assert_eq!(ev, dec!(50_882_392_000));
        let ev_ebitda = ev_to_ebitda(ev, dec!(12_000_000_000)).value().unwrap();
        assert_eq!(ev_ebitda.round_dp(2), dec!(4.24));
        assert!(enterprise_value(mcap, dec!(1_000)).unwrap() > mcap);
    }

    #[test]
    fn test_ev_ebitda_not_applicable() {
        assert!(!ev_to_ebitda(dec!(50_000), Decimal::ZERO).is_applicable());
        assert!(!ev_to_ebitda(dec!(50_000), dec!(-100)).is_applicable());
    }

    #[test]
    fn test_pcfr() {
        // FCF 500m over 9m shares = 55.56 per share; 1250 / 55.56 = 22.5
        let pcfr = price_to_fcf(dec!(1250), dec!(500_000_000), dec!(9_000_000));
        assert_eq!(pcfr.value().unwrap().round_dp(2), dec!(22.50));
        assert!(!price_to_fcf(dec!(1250), dec!(-1), dec!(9_000_000)).is_applicable());
    }
}
