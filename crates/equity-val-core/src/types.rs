use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percentages on a 0-100 scale (12.5 = 12.5%). Only used for reported figures.
pub type Percent = Decimal;

/// Multiples (e.g., 8.5x EV/EBITDA)
pub type Multiple = Decimal;

/// Per-share amounts in the reporting currency
pub type PerShare = Decimal;

/// Currency code. Serialized as its ISO code string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Currency {
    #[default]
    JPY,
    USD,
    EUR,
    GBP,
    CHF,
    CAD,
    AUD,
    HKD,
    SGD,
    Other(String),
}

impl Currency {
    /// Parse an ISO 4217 style code. Unrecognised codes become `Other`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "JPY" => Currency::JPY,
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            "GBP" => Currency::GBP,
            "CHF" => Currency::CHF,
            "CAD" => Currency::CAD,
            "AUD" => Currency::AUD,
            "HKD" => Currency::HKD,
            "SGD" => Currency::SGD,
            other => Currency::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Currency::JPY => "JPY",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::Other(code) => code,
        }
    }

    /// Smallest practical unit for displaying prices, as decimal places.
    pub fn minor_units(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        Currency::from_code(&code)
    }
}

const OUT_OF_RANGE: &str = "Ratio exceeds the decimal range";

/// A ratio that may be mathematically undefined for the given inputs.
///
/// Loss-making companies and negative book values are legitimate states, so a
/// zero or negative denominator yields `NotApplicable` with a reason rather
/// than an error, a zero or an infinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Value(Decimal),
    NotApplicable(String),
}

impl Metric {
    /// `numerator / denominator`, or `NotApplicable(reason)` when the
    /// denominator is zero or negative. A quotient outside the decimal range
    /// (a vanishingly small denominator) is not applicable as well.
    pub fn ratio(numerator: Decimal, denominator: Decimal, reason: &str) -> Self {
        if denominator <= Decimal::ZERO {
            return Metric::NotApplicable(reason.to_string());
        }
        match numerator.checked_div(denominator) {
            Some(v) => Metric::Value(v),
            None => Metric::NotApplicable(OUT_OF_RANGE.to_string()),
        }
    }

    /// Ratio expressed on a 0-100 scale.
    pub fn percent(self) -> Self {
        match self {
            Metric::Value(v) => v
                .checked_mul(Decimal::ONE_HUNDRED)
                .map(Metric::Value)
                .unwrap_or_else(|| Metric::NotApplicable(OUT_OF_RANGE.to_string())),
            na => na,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::NotApplicable(_) => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Metric::Value(_))
    }

    pub fn map(self, f: impl FnOnce(Decimal) -> Decimal) -> Self {
        match self {
            Metric::Value(v) => Metric::Value(f(v)),
            na => na,
        }
    }

    pub fn round_dp(&self, dp: u32) -> Self {
        self.clone().map(|v| round_half_away(v, dp))
    }
}

/// Display rounding used at the result boundary.
pub fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation. Carries no timings so that identical
/// input serializes to identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
