use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::ValuationError;
use crate::input::ValuationInput;
use crate::normalize::NormalizedFinancials;
use crate::types::{Metric, Money, Percent, PerShare, Rate};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Named growth scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// No growth over the explicit horizon
    Bear,
    Middle,
    Strong,
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::Bear => write!(f, "bear"),
            ScenarioKind::Middle => write!(f, "middle"),
            ScenarioKind::Strong => write!(f, "strong"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcfScenario {
    pub kind: ScenarioKind,
    pub growth_rate: Rate,
}

/// Inputs shared by every scenario of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    /// Base-year free cash flow in base currency units
    pub base_fcf: Money,
    pub discount_rate: Rate,
    pub terminal_growth_rate: Rate,
    pub years: u32,
    pub net_debt: Money,
    /// Raw share count
    pub shares: Decimal,
    pub stock_price: PerShare,
}

/// Projection for a single year of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfYearProjection {
    pub year: u32,
    pub cash_flow: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Output of one DCF scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfScenarioOutput {
    pub scenario: ScenarioKind,
    pub growth_rate: Rate,
    /// False when the base FCF is not positive and the series was held flat
    pub growth_compounded: bool,
    pub projections: Vec<DcfYearProjection>,
    /// Sum of present values of explicit-period cash flows
    pub pv_of_cash_flows: Money,
    /// Gordon growth terminal value at the end of the horizon
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    /// PV(cash flows) + PV(terminal)
    pub enterprise_value: Money,
    /// Enterprise value less net debt
    pub equity_value: Money,
    pub implied_price: PerShare,
    /// (implied - price) / price x 100
    pub upside_pct: Percent,
    /// PV(terminal) / enterprise value, as a percentage
    pub terminal_value_pct: Metric,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scenario set for an input: bear (zero growth), middle and strong.
pub fn scenarios_for(input: &ValuationInput) -> Vec<DcfScenario> {
    vec![
        DcfScenario {
            kind: ScenarioKind::Bear,
            growth_rate: Decimal::ZERO,
        },
        DcfScenario {
            kind: ScenarioKind::Middle,
            growth_rate: input.dcf_growth_middle,
        },
        DcfScenario {
            kind: ScenarioKind::Strong,
            growth_rate: input.dcf_growth_strong,
        },
    ]
}

/// Run every scenario. Any divergent scenario fails the whole evaluation.
pub fn run_scenarios(
    input: &ValuationInput,
    financials: &NormalizedFinancials,
    config: &EngineConfig,
    warnings: &mut Vec<String>,
) -> EngineResult<Vec<DcfScenarioOutput>> {
    let assumptions = DcfAssumptions {
        base_fcf: financials.fcf,
        discount_rate: input.discount_rate,
        terminal_growth_rate: config.terminal_growth_rate,
        years: input.dcf_years,
        net_debt: financials.net_debt(),
        shares: financials.shares,
        stock_price: input.stock_price,
    };

    if input.dcf_growth_strong < input.dcf_growth_middle {
        warnings.push(format!(
            "Strong growth ({}) is below middle growth ({}); scenario labels are inverted",
            input.dcf_growth_strong, input.dcf_growth_middle
        ));
    }
    if assumptions.base_fcf <= Decimal::ZERO {
        warnings.push(
            "Free cash flow is not positive; DCF projections are held flat instead of compounding growth"
                .into(),
        );
    }

    let outputs = scenarios_for(input)
        .iter()
        .map(|scenario| project_scenario(scenario, &assumptions))
        .collect::<EngineResult<Vec<_>>>()?;

    for out in &outputs {
        if let Some(pct) = out.terminal_value_pct.value() {
            if pct > dec!(75) {
                warnings.push(format!(
                    "[{}] Terminal value represents {:.1}% of enterprise value",
                    out.scenario, pct
                ));
            }
        }
    }

    Ok(outputs)
}

/// Project, discount and bridge one scenario to a per-share value.
pub fn project_scenario(
    scenario: &DcfScenario,
    assumptions: &DcfAssumptions,
) -> EngineResult<DcfScenarioOutput> {
    let r = assumptions.discount_rate;
    let g_t = assumptions.terminal_growth_rate;

    check_convergence(&scenario.kind.to_string(), scenario.growth_rate, r)?;
    check_convergence("terminal", g_t, r)?;

    let compound = assumptions.base_fcf > Decimal::ZERO;
    let growth = if compound {
        scenario.growth_rate
    } else {
        Decimal::ZERO
    };

    let projections = build_projections(assumptions.base_fcf, growth, r, assumptions.years)?;
    let pv_of_cash_flows = projections
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.present_value))
        .ok_or_else(|| overflow("fcf", "Present value of cash flows"))?;
    let last = projections.last().ok_or_else(|| {
        ValuationError::invalid("dcf_years", "No projection years generated")
    })?;

    // --- Terminal value (Gordon growth) ---
    let terminal_value = last
        .cash_flow
        .checked_mul(Decimal::ONE + g_t)
        .ok_or_else(|| overflow("fcf", "Terminal cash flow"))?
        .checked_div(r - g_t)
        .ok_or_else(|| overflow("discount_rate", "Terminal value"))?;
    let pv_of_terminal = terminal_value
        .checked_mul(last.discount_factor)
        .ok_or_else(|| overflow("fcf", "Present value of terminal value"))?;

    // --- Equity bridge ---
    let enterprise_value = pv_of_cash_flows
        .checked_add(pv_of_terminal)
        .ok_or_else(|| overflow("fcf", "DCF enterprise value"))?;
    let equity_value = enterprise_value
        .checked_sub(assumptions.net_debt)
        .ok_or_else(|| overflow("net_cash", "DCF equity value"))?;
    let implied_price = equity_value
        .checked_div(assumptions.shares)
        .ok_or_else(|| overflow("shares_outstanding_ex_treasury", "Implied price"))?;
    let upside_pct = implied_price
        .checked_sub(assumptions.stock_price)
        .and_then(|d| d.checked_div(assumptions.stock_price))
        .and_then(|u| u.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| overflow("stock_price", "DCF upside"))?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Metric::NotApplicable("Enterprise value is zero".into())
    } else {
        pv_of_terminal
            .checked_div(enterprise_value)
            .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
            .map_or_else(
                || Metric::NotApplicable("Terminal share exceeds the decimal range".into()),
                Metric::Value,
            )
    };

    tracing::trace!(
        scenario = %scenario.kind,
        %enterprise_value,
        %implied_price,
        "DCF scenario projected"
    );

    Ok(DcfScenarioOutput {
        scenario: scenario.kind,
        growth_rate: scenario.growth_rate,
        growth_compounded: compound,
        projections,
        pv_of_cash_flows,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        equity_value,
        implied_price,
        upside_pct,
        terminal_value_pct,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// The perpetuity only converges when the discount rate exceeds growth.
fn check_convergence(scenario: &str, growth_rate: Rate, discount_rate: Rate) -> EngineResult<()> {
    if discount_rate <= growth_rate {
        return Err(ValuationError::DivergentScenario {
            scenario: scenario.to_string(),
            growth_rate,
            discount_rate,
        });
    }
    Ok(())
}

/// `cf_t = base x (1+g)^t`, `pv_t = cf_t / (1+r)^t` for t = 1..=years.
fn build_projections(
    base_fcf: Money,
    growth: Rate,
    discount_rate: Rate,
    years: u32,
) -> EngineResult<Vec<DcfYearProjection>> {
    let mut projections = Vec::with_capacity(years as usize);
    let mut growth_factor = Decimal::ONE;
    let mut compounding = Decimal::ONE;

    for year in 1..=years {
        growth_factor = growth_factor
            .checked_mul(Decimal::ONE + growth)
            .ok_or_else(|| overflow("dcf_years", "Compounded growth"))?;
        compounding = compounding
            .checked_mul(Decimal::ONE + discount_rate)
            .ok_or_else(|| overflow("dcf_years", "Compounded discount"))?;

        let cash_flow = base_fcf
            .checked_mul(growth_factor)
            .ok_or_else(|| overflow("fcf", "Projected cash flow"))?;
        let discount_factor = Decimal::ONE / compounding;
        let present_value = cash_flow
            .checked_div(compounding)
            .ok_or_else(|| overflow("fcf", "Present value"))?;

        projections.push(DcfYearProjection {
            year,
            cash_flow,
            discount_factor,
            present_value,
        });
    }

    Ok(projections)
}

fn overflow(field: &str, what: &str) -> ValuationError {
    ValuationError::out_of_range(field, what)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_assumptions() -> DcfAssumptions {
        DcfAssumptions {
            base_fcf: dec!(500_000_000),
            discount_rate: dec!(0.08),
            terminal_growth_rate: Decimal::ZERO,
            years: 5,
            net_debt: Decimal::ZERO,
            shares: dec!(9_000_000),
            stock_price: dec!(1250),
        }
    }

    fn scenario(kind: ScenarioKind, growth_rate: Decimal) -> DcfScenario {
        DcfScenario { kind, growth_rate }
    }

    fn close(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_middle_scenario_values() {
        let out = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &sample_assumptions())
            .unwrap();

        assert_eq!(out.projections.len(), 5);
        // Year 1: 500m x 1.03 = 515m, discounted by 1.08
        assert_eq!(out.projections[0].cash_flow, dec!(515_000_000));
        assert!(close(out.projections[0].present_value, dec!(476_851_851.85), dec!(0.01)));

        // Explicit PV ~ 2,173.48m; TV = cf_5 / 0.08 ~ 7,245.46m; PV(TV) ~ 4,931.14m
        assert!(close(out.pv_of_cash_flows, dec!(2_173_480_706.03), dec!(0.01)));
        assert!(close(out.terminal_value, dec!(7_245_462_964.375), dec!(0.01)));
        assert!(close(out.pv_of_terminal, dec!(4_931_140_348.28), dec!(0.01)));
        assert!(out.enterprise_value > Decimal::ZERO);
        assert_eq!(out.equity_value, out.enterprise_value);

        // 7,104.62m / 9m shares
        assert!(close(out.implied_price, dec!(789.4023), dec!(0.0001)));
        assert!(out.upside_pct < Decimal::ZERO);
        assert!(out.growth_compounded);
    }

    #[test]
    fn test_bear_scenario_is_zero_growth_perpetuity() {
        // With no growth the annuity plus discounted perpetuity collapses to FCF / r.
        let mut a = sample_assumptions();
        a.base_fcf = dec!(1_666_000_000);
        a.discount_rate = dec!(0.10);
        a.net_debt = dec!(-13_692_000_000);
        a.shares = dec!(6_841_000);
        a.stock_price = dec!(2527);

        let out = project_scenario(&scenario(ScenarioKind::Bear, Decimal::ZERO), &a).unwrap();
        assert!(close(out.enterprise_value, dec!(16_660_000_000), dec!(0.001)));
        assert!(close(out.equity_value, dec!(30_352_000_000), dec!(0.001)));
        assert_eq!(out.implied_price.round_dp(0), dec!(4437));
    }

    #[test]
    fn test_equal_growth_and_discount_diverges() {
        let mut a = sample_assumptions();
        a.discount_rate = dec!(0.03);
        let err = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap_err();
        match err {
            ValuationError::DivergentScenario {
                scenario,
                growth_rate,
                discount_rate,
            } => {
                assert_eq!(scenario, "middle");
                assert_eq!(growth_rate, dec!(0.03));
                assert_eq!(discount_rate, dec!(0.03));
            }
            other => panic!("expected DivergentScenario, got {other:?}"),
        }
    }

    #[test]
    fn test_terminal_growth_at_discount_rate_diverges() {
        let mut a = sample_assumptions();
        a.terminal_growth_rate = dec!(0.08);
        let err = project_scenario(&scenario(ScenarioKind::Bear, Decimal::ZERO), &a).unwrap_err();
        assert!(matches!(err, ValuationError::DivergentScenario { ref scenario, .. } if scenario == "terminal"));
    }

    #[test]
    fn test_terminal_growth_raises_value() {
        let base = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &sample_assumptions())
            .unwrap();
        let mut a = sample_assumptions();
        a.terminal_growth_rate = dec!(0.01);
        let grown = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap();
        assert!(grown.terminal_value > base.terminal_value);
        assert_eq!(grown.pv_of_cash_flows, base.pv_of_cash_flows);
    }

    #[test]
    fn test_higher_growth_gives_higher_price() {
        let a = sample_assumptions();
        let middle = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap();
        let strong = project_scenario(&scenario(ScenarioKind::Strong, dec!(0.06)), &a).unwrap();
        assert!(strong.implied_price > middle.implied_price);
        assert!(close(strong.implied_price, dec!(895.2033), dec!(0.0001)));
    }

    #[test]
    fn test_negative_fcf_is_held_flat() {
        let mut a = sample_assumptions();
        a.base_fcf = dec!(-200_000_000);
        let middle = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap();
        let strong = project_scenario(&scenario(ScenarioKind::Strong, dec!(0.06)), &a).unwrap();
        assert!(!middle.growth_compounded);
        assert!(middle
            .projections
            .iter()
            .all(|p| p.cash_flow == dec!(-200_000_000)));
        assert_eq!(middle.implied_price, strong.implied_price);
    }

    fn invalid_field(err: ValuationError) -> String {
        match err {
            ValuationError::InvalidInput { field, .. } => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_cash_flow_overflow_names_fcf() {
        let mut a = sample_assumptions();
        a.base_fcf = Decimal::MAX / dec!(2);
        let err = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap_err();
        assert_eq!(invalid_field(err), "fcf");
    }

    #[test]
    fn test_long_horizon_overflow_names_dcf_years() {
        let mut a = sample_assumptions();
        a.discount_rate = dec!(0.99);
        a.years = 100;
        let err = project_scenario(&scenario(ScenarioKind::Bear, Decimal::ZERO), &a).unwrap_err();
        assert_eq!(invalid_field(err), "dcf_years");
    }

    #[test]
    fn test_vanishing_terminal_spread_names_discount_rate() {
        let mut a = sample_assumptions();
        a.terminal_growth_rate = dec!(0.08) - Decimal::new(1, 28);
        let err = project_scenario(&scenario(ScenarioKind::Bear, Decimal::ZERO), &a).unwrap_err();
        assert_eq!(invalid_field(err), "discount_rate");
    }

    #[test]
    fn test_net_debt_reduces_equity() {
        let mut a = sample_assumptions();
        a.net_debt = dec!(1_000_000_000);
        let out = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &a).unwrap();
        assert_eq!(out.equity_value, out.enterprise_value - dec!(1_000_000_000));
    }

    #[test]
    fn test_discount_factors_decline() {
        let out = project_scenario(&scenario(ScenarioKind::Middle, dec!(0.03)), &sample_assumptions())
            .unwrap();
        for pair in out.projections.windows(2) {
            assert!(pair[1].discount_factor < pair[0].discount_factor);
        }
        let tv_pct = out.terminal_value_pct.value().unwrap();
        assert!(tv_pct > Decimal::ZERO && tv_pct < dec!(100));
    }
}
