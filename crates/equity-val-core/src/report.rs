//! Result assembly and the single boundary rounding pass.
//!
//! Calculators work at full 28-digit precision. Rounding happens here, once,
//! per field class: prices and money to the currency's minor unit,
//! percentages and multiples to two places, rates and discount factors to
//! six.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::input::ValuationInput;
use crate::normalize::NormalizedFinancials;
use crate::rating::Rating;
use crate::types::{round_half_away, Currency, Metric, Money, Percent, PerShare};
use crate::valuation::dcf::{DcfScenarioOutput, DcfYearProjection};
use crate::valuation::liquidation::LiquidationCheck;
use crate::valuation::multiples::MarketMultiples;
use crate::valuation::profitability::ProfitabilityMetrics;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Decimal places per field class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub price_dp: u32,
    pub percent_dp: u32,
    pub multiple_dp: u32,
    pub rate_dp: u32,
}

impl RoundingPolicy {
    pub fn for_currency(currency: &Currency) -> Self {
        Self {
            price_dp: currency.minor_units(),
            percent_dp: 2,
            multiple_dp: 2,
            rate_dp: 6,
        }
    }

    fn price(&self, v: Decimal) -> Decimal {
        round_half_away(v, self.price_dp)
    }

    fn percent(&self, v: Decimal) -> Decimal {
        round_half_away(v, self.percent_dp)
    }

    fn rate(&self, v: Decimal) -> Decimal {
        round_half_away(v, self.rate_dp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerShareBlock {
    pub per_actual: Metric,
    pub per_forecast: Metric,
    pub pbr: Metric,
    pub dividend_yield_pct: Percent,
    pub pcfr: Metric,
    pub psr: Metric,
    pub pcr: Metric,
    pub per_x_pbr: Metric,
    pub fcf_per_share: PerShare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseBlock {
    pub market_cap: Money,
    pub net_debt: Money,
    pub enterprise_value: Money,
    pub ev_ebitda: Metric,
}

/// The engine's answer for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub currency: Currency,
    pub stock_price: PerShare,
    /// Raw share count used for every per-share division
    pub shares: Decimal,
    pub per_share: PerShareBlock,
    pub enterprise: EnterpriseBlock,
    pub profitability: ProfitabilityMetrics,
    /// One entry per scenario, bear / middle / strong
    pub dcf: Vec<DcfScenarioOutput>,
    pub liquidation: LiquidationCheck,
    pub rating: Rating,
    /// Input fields rescaled from thousands by the normalizer
    pub rescaled_fields: Vec<String>,
}

/// Calculator outputs at full precision, ready for assembly.
#[derive(Debug, Clone)]
pub struct ComputedMetrics {
    pub multiples: MarketMultiples,
    pub profitability: ProfitabilityMetrics,
    pub dcf: Vec<DcfScenarioOutput>,
    pub liquidation: LiquidationCheck,
    pub rating: Rating,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn assemble(
    input: &ValuationInput,
    financials: &NormalizedFinancials,
    computed: ComputedMetrics,
) -> ValuationResult {
    let policy = RoundingPolicy::for_currency(&input.currency);
    let ComputedMetrics {
        multiples: m,
        profitability,
        dcf,
        liquidation,
        mut rating,
    } = computed;

    let multiple = |metric: &Metric| metric.round_dp(policy.multiple_dp);

    let per_share = PerShareBlock {
        per_actual: multiple(&m.per_actual),
        per_forecast: multiple(&m.per_forecast),
        pbr: multiple(&m.pbr),
        dividend_yield_pct: policy.percent(m.dividend_yield_pct),
        pcfr: multiple(&m.pcfr),
        psr: multiple(&m.psr),
        pcr: multiple(&m.pcr),
        per_x_pbr: multiple(&m.per_x_pbr),
        fcf_per_share: policy.price(m.fcf_per_share),
    };

    let enterprise = EnterpriseBlock {
        market_cap: policy.price(m.market_cap),
        net_debt: policy.price(m.net_debt),
        enterprise_value: policy.price(m.enterprise_value),
        ev_ebitda: multiple(&m.ev_ebitda),
    };

    let profitability = ProfitabilityMetrics {
        nopat: policy.price(profitability.nopat),
        invested_capital: policy.price(profitability.invested_capital),
        roic_pct: profitability.roic_pct.round_dp(policy.percent_dp),
    };

    let dcf = dcf.iter().map(|s| round_scenario(s, &policy)).collect();

    let liquidation = LiquidationCheck {
        liquidation_value_per_share: policy.price(liquidation.liquidation_value_per_share),
        discount_pct: liquidation.discount_pct.round_dp(policy.percent_dp),
        position: liquidation.position,
    };

    rating.net_cash_to_market_cap = policy.rate(rating.net_cash_to_market_cap);

    ValuationResult {
        company_name: input.company_name.clone(),
        as_of: input.as_of,
        currency: input.currency.clone(),
        stock_price: input.stock_price,
        shares: financials.shares,
        per_share,
        enterprise,
        profitability,
        dcf,
        liquidation,
        rating,
        rescaled_fields: financials.rescaled_fields.clone(),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn round_scenario(s: &DcfScenarioOutput, policy: &RoundingPolicy) -> DcfScenarioOutput {
    DcfScenarioOutput {
        scenario: s.scenario,
        growth_rate: policy.rate(s.growth_rate),
        growth_compounded: s.growth_compounded,
        projections: s
            .projections
            .iter()
            .map(|p| DcfYearProjection {
                year: p.year,
                cash_flow: policy.price(p.cash_flow),
                discount_factor: policy.rate(p.discount_factor),
                present_value: policy.price(p.present_value),
            })
            .collect(),
        pv_of_cash_flows: policy.price(s.pv_of_cash_flows),
        terminal_value: policy.price(s.terminal_value),
        pv_of_terminal: policy.price(s.pv_of_terminal),
        enterprise_value: policy.price(s.enterprise_value),
        equity_value: policy.price(s.equity_value),
        implied_price: policy.price(s.implied_price),
        upside_pct: policy.percent(s.upside_pct),
        terminal_value_pct: s.terminal_value_pct.round_dp(policy.percent_dp),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
