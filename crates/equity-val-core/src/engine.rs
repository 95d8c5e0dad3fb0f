//! The single evaluation entry point.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::ValuationError;
use crate::input::ValuationInput;
use crate::normalize::NormalizedFinancials;
use crate::rating::rate;
use crate::report::{assemble, ComputedMetrics, ValuationResult};
use crate::types::{with_metadata, ComputationOutput};
use crate::valuation::dcf::{run_scenarios, ScenarioKind};
use crate::valuation::liquidation::check_liquidation;
use crate::valuation::multiples::calculate_multiples;
use crate::valuation::profitability::calculate_profitability;
use crate::EngineResult;

const METHODOLOGY: &str =
    "Price multiples, 3-scenario FCF DCF (Gordon terminal value), liquidation check, rule-based rating";

/// Evaluate one snapshot.
///
/// Pure: the output depends only on `input` and `config`, and identical
/// arguments serialize to identical output. A divergent DCF scenario fails
/// the whole call; no partial result is returned.
pub fn evaluate(
    input: &ValuationInput,
    config: &EngineConfig,
) -> EngineResult<ComputationOutput<ValuationResult>> {
    config.validate()?;
    input.validate(config)?;

    tracing::debug!(
        company = input.company_name.as_deref().unwrap_or("-"),
        price = %input.stock_price,
        "evaluating snapshot"
    );

    let mut warnings: Vec<String> = Vec::new();

    // --- Normalize ---
    let financials = NormalizedFinancials::from_input(input, &config.normalization)?;
    for field in &financials.rescaled_fields {
        warnings.push(format!(
            "{field} exceeded the normalization threshold and was read as thousands"
        ));
    }

    // --- Independent calculators ---
    let multiples = calculate_multiples(input, &financials)?;
    let profitability = calculate_profitability(input, &financials)?;
    let liquidation = check_liquidation(input.stock_price, input.liquidation_value_per_share);
    let dcf = run_scenarios(input, &financials, config, &mut warnings)?;

    // --- Rating ---
    let middle = dcf
        .iter()
        .find(|s| s.scenario == ScenarioKind::Middle)
        .ok_or_else(|| ValuationError::invalid("dcf_growth_middle", "Middle scenario missing"))?;
    let rating = rate(
        &multiples.per_forecast,
        &multiples.pbr,
        financials.net_cash,
        multiples.market_cap,
        middle.upside_pct,
        &config.rating,
    )?;

    tracing::debug!(tier = %rating.tier, score = rating.total_score, "rating synthesized");

    let result = assemble(
        input,
        &financials,
        ComputedMetrics {
            multiples,
            profitability,
            dcf,
            liquidation,
            rating,
        },
    );

    Ok(with_metadata(METHODOLOGY, config, warnings, result))
}

/// Parse, validate and evaluate an input document.
pub fn evaluate_value(
    document: Value,
    config: &EngineConfig,
) -> EngineResult<ComputationOutput<ValuationResult>> {
    let input = ValuationInput::from_value(document)?;
    evaluate(&input, config)
}
