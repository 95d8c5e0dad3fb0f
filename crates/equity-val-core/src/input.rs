//! Company snapshot fed to the engine, and the document boundary that builds it.
//!
//! Source documents are loosely typed key/value maps produced by filing
//! extractors. [`ValuationInput::from_value`] turns one into a typed snapshot
//! in a single pass: unknown keys, missing required keys and non-numeric
//! values are all rejected with the offending field named.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::ValuationError;
use crate::types::{Currency, Money, PerShare, Rate};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Unit in which the share count is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharesUnit {
    #[default]
    Shares,
    Thousands,
}

impl SharesUnit {
    /// Multiplier that converts a reported count into a raw share count.
    pub fn scale(self) -> Decimal {
        match self {
            SharesUnit::Shares => Decimal::ONE,
            SharesUnit::Thousands => dec!(1000),
        }
    }
}

impl FromStr for SharesUnit {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shares" => Ok(SharesUnit::Shares),
            "thousands" => Ok(SharesUnit::Thousands),
            other => Err(ValuationError::invalid(
                "shares_unit",
                format!("Expected \"shares\" or \"thousands\", got \"{other}\""),
            )),
        }
    }
}

/// Immutable financial snapshot for one company at one price.
///
/// Entity-level monetary fields are taken as reported. Their unit is
/// resolved later by the normalizer. Deserializing goes through
/// [`ValuationInput::from_value`], so serde callers get the same field checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ValuationInput {
    /// Current share price
    pub stock_price: PerShare,
    /// Shares outstanding excluding treasury stock, in `shares_unit`
    pub shares_outstanding_ex_treasury: u64,
    pub shares_unit: SharesUnit,
    /// Book value per share
    pub bps: PerShare,
    /// Trailing EPS; may be zero or negative
    pub eps_actual: PerShare,
    /// Forecast EPS; may be zero or negative
    pub eps_forecast: PerShare,
    /// Annual dividend per share
    pub dividend_annual: PerShare,
    pub revenue: Money,
    pub operating_profit: Money,
    pub net_income: Money,
    pub operating_cf: Money,
    /// Free cash flow, the DCF base
    pub fcf: Money,
    /// Cash minus interest-bearing debt; negative means net debt
    pub net_cash: Money,
    pub ebitda: Money,
    pub net_assets: Money,
    pub effective_tax_rate: Rate,
    pub discount_rate: Rate,
    pub liquidation_value_per_share: PerShare,
    pub dcf_growth_middle: Rate,
    pub dcf_growth_strong: Rate,
    /// Explicit DCF forecast horizon in years
    pub dcf_years: u32,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Caller-supplied valuation date, echoed into the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

const FIELDS: &[&str] = &[
    "stock_price",
    "shares_outstanding_ex_treasury",
    "shares_outstanding",
    "treasury_shares",
    "shares_unit",
    "bps",
    "eps_actual",
    "eps_forecast",
    "dividend_annual",
    "revenue",
    "operating_profit",
    "net_income",
    "operating_cf",
    "fcf",
    "net_cash",
    "ebitda",
    "net_assets",
    "effective_tax_rate",
    "discount_rate",
    "liquidation_value_per_share",
    "dcf_growth_middle",
    "dcf_growth_strong",
    "dcf_years",
    "currency",
    "company_name",
    "as_of",
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse document text. Malformed JSON is reported against the `input`
/// field so it is classed with the other validation failures.
pub fn parse_document(s: &str) -> EngineResult<Value> {
    serde_json::from_str(s)
        .map_err(|e| ValuationError::invalid("input", format!("Malformed JSON document: {e}")))
}

impl TryFrom<Value> for ValuationInput {
    type Error = ValuationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl ValuationInput {
    /// Parse a JSON document into a snapshot. Does not run range checks;
    /// those happen in [`ValuationInput::validate`].
    pub fn from_json_str(s: &str) -> EngineResult<Self> {
        Self::from_value(parse_document(s)?)
    }

    pub fn from_value(value: Value) -> EngineResult<Self> {
        let Value::Object(map) = value else {
            return Err(ValuationError::invalid(
                "input",
                "Input document must be a JSON object",
            ));
        };
        let mut reader = FieldReader::new(map)?;

        let shares_outstanding_ex_treasury = reader.resolve_share_count()?;
        let shares_unit = match reader.optional_string("shares_unit")? {
            Some(s) => s.parse()?,
            None => {
                return Err(ValuationError::invalid(
                    "shares_unit",
                    "Required field is missing",
                ))
            }
        };

        let input = ValuationInput {
            stock_price: reader.decimal("stock_price")?,
            shares_outstanding_ex_treasury,
            shares_unit,
            bps: reader.decimal("bps")?,
            eps_actual: reader.decimal("eps_actual")?,
            eps_forecast: reader.decimal("eps_forecast")?,
            dividend_annual: reader.decimal("dividend_annual")?,
            revenue: reader.decimal("revenue")?,
            operating_profit: reader.decimal("operating_profit")?,
            net_income: reader.decimal("net_income")?,
            operating_cf: reader.decimal("operating_cf")?,
            fcf: reader.decimal("fcf")?,
            net_cash: reader.decimal("net_cash")?,
            ebitda: reader.decimal("ebitda")?,
            net_assets: reader.decimal("net_assets")?,
            effective_tax_rate: reader.decimal("effective_tax_rate")?,
            discount_rate: reader.decimal("discount_rate")?,
            liquidation_value_per_share: reader.decimal("liquidation_value_per_share")?,
            dcf_growth_middle: reader.decimal("dcf_growth_middle")?,
            dcf_growth_strong: reader.decimal("dcf_growth_strong")?,
            dcf_years: reader.years("dcf_years")?,
            currency: reader
                .optional_string("currency")?
                .map(|c| Currency::from_code(&c))
                .unwrap_or_default(),
            company_name: reader.optional_string("company_name")?,
            as_of: reader.optional_date("as_of")?,
        };

        Ok(input)
    }

    /// Raw share count, with the reporting unit applied.
    pub fn raw_shares(&self) -> Decimal {
        Decimal::from(self.shares_outstanding_ex_treasury) * self.shares_unit.scale()
    }

    /// Range checks. Fails fast on the first offending field.
    pub fn validate(&self, config: &EngineConfig) -> EngineResult<()> {
        if self.stock_price <= Decimal::ZERO {
            return Err(ValuationError::invalid(
                "stock_price",
                "Stock price must be positive",
            ));
        }
        if self.shares_outstanding_ex_treasury == 0 {
            return Err(ValuationError::invalid(
                "shares_outstanding_ex_treasury",
                "Share count must be positive",
            ));
        }
        check_unit_interval("effective_tax_rate", self.effective_tax_rate)?;
        check_unit_interval("discount_rate", self.discount_rate)?;
        if self.liquidation_value_per_share < Decimal::ZERO {
            return Err(ValuationError::invalid(
                "liquidation_value_per_share",
                "Liquidation value cannot be negative",
            ));
        }
        for (field, g) in [
            ("dcf_growth_middle", self.dcf_growth_middle),
            ("dcf_growth_strong", self.dcf_growth_strong),
        ] {
            if g <= dec!(-1) {
                return Err(ValuationError::invalid(
                    field,
                    "Growth rate must be greater than -1",
                ));
            }
        }
        if self.dcf_years == 0 || self.dcf_years > config.max_dcf_years {
            return Err(ValuationError::invalid(
                "dcf_years",
                format!("Must be between 1 and {}", config.max_dcf_years),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_unit_interval(field: &str, rate: Rate) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(ValuationError::invalid(field, "Must be in [0, 1)"));
    }
    Ok(())
}

/// Consumes fields from a document map, naming the field in every error.
struct FieldReader {
    fields: Map<String, Value>,
}

impl FieldReader {
    fn new(fields: Map<String, Value>) -> EngineResult<Self> {
        if let Some(unknown) = fields.keys().find(|k| !FIELDS.contains(&k.as_str())) {
            return Err(ValuationError::invalid(unknown, "Unknown field"));
        }
        Ok(Self { fields })
    }

    /// Present and non-null value for `key`, if any.
    fn take(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key).filter(|v| !v.is_null())
    }

    fn decimal(&mut self, key: &str) -> EngineResult<Decimal> {
        self.optional_decimal(key)?
            .ok_or_else(|| ValuationError::invalid(key, "Required field is missing"))
    }

    fn optional_decimal(&mut self, key: &str) -> EngineResult<Option<Decimal>> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        let parsed = match &value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s.trim()),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| ValuationError::invalid(key, format!("Expected a number, got {value}")))
    }

    fn optional_count(&mut self, key: &str) -> EngineResult<Option<u64>> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        let parsed = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            ValuationError::invalid(key, format!("Expected a non-negative integer, got {value}"))
        })
    }

    fn years(&mut self, key: &str) -> EngineResult<u32> {
        let count = self
            .optional_count(key)?
            .ok_or_else(|| ValuationError::invalid(key, "Required field is missing"))?;
        u32::try_from(count).map_err(|_| ValuationError::invalid(key, "Value is too large"))
    }

    fn optional_string(&mut self, key: &str) -> EngineResult<Option<String>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ValuationError::invalid(
                key,
                format!("Expected a string, got {other}"),
            )),
        }
    }

    fn optional_date(&mut self, key: &str) -> EngineResult<Option<NaiveDate>> {
        self.optional_string(key)?
            .map(|s| {
                s.parse::<NaiveDate>()
                    .map_err(|e| ValuationError::invalid(key, format!("Expected YYYY-MM-DD: {e}")))
            })
            .transpose()
    }

    /// `shares_outstanding_ex_treasury` wins; otherwise derive it from
    /// `shares_outstanding - treasury_shares`.
    fn resolve_share_count(&mut self) -> EngineResult<u64> {
        let ex_treasury = self.optional_count("shares_outstanding_ex_treasury")?;
        let outstanding = self.optional_count("shares_outstanding")?;
        let treasury = self.optional_count("treasury_shares")?;

        match (ex_treasury, outstanding) {
            (Some(n), _) => Ok(n),
            (None, Some(total)) => total.checked_sub(treasury.unwrap_or(0)).ok_or_else(|| {
                ValuationError::invalid("treasury_shares", "Exceeds shares_outstanding")
            }),
            (None, None) => Err(ValuationError::invalid(
                "shares_outstanding_ex_treasury",
                "Required field is missing (or provide shares_outstanding)",
            )),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
