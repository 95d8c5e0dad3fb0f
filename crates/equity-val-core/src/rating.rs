//! Qualitative rating from the computed metrics.
//!
//! Each factor is banded, each band casts a vote, and the votes are summed.
//! A clear majority (|total| >= 2) sets the tier directly. Weaker signals
//! defer to the leading factor, the first non-neutral vote in the fixed
//! priority order: DCF upside, then asset backing, then earnings multiple.
//! The mapping is total over every band combination, including
//! not-applicable metrics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RatingConfig;
use crate::error::ValuationError;
use crate::types::{Metric, Money, Percent, Rate};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Five-tier ordinal scale, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTier {
    StrongBuy,
    Buy,
    Hold,
    Avoid,
    StrongAvoid,
}

impl std::fmt::Display for RatingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingTier::StrongBuy => write!(f, "Strong Buy"),
            RatingTier::Buy => write!(f, "Buy"),
            RatingTier::Hold => write!(f, "Hold"),
            RatingTier::Avoid => write!(f, "Avoid"),
            RatingTier::StrongAvoid => write!(f, "Strong Avoid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Bullish,
    Neutral,
    Bearish,
}

impl Vote {
    pub fn score(self) -> i8 {
        match self {
            Vote::Bullish => 1,
            Vote::Neutral => 0,
            Vote::Bearish => -1,
        }
    }

    fn from_score(score: i8) -> Self {
        match score.signum() {
            1 => Vote::Bullish,
            -1 => Vote::Bearish,
            _ => Vote::Neutral,
        }
    }
}

/// Sign of the middle-scenario DCF upside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsideBand {
    Positive,
    Flat,
    Negative,
}

/// Net cash relative to market capitalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetBand {
    Rich,
    Neutral,
    Indebted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerBand {
    Cheap,
    Fair,
    Expensive,
    /// Forecast EPS is zero or negative
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PbrBand {
    BelowBook,
    Fair,
    Rich,
    /// Book value is zero or negative
    NotApplicable,
}

/// Rating factors in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingFactor {
    DcfUpside,
    AssetBacking,
    EarningsMultiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSignals {
    pub upside: UpsideBand,
    pub assets: AssetBand,
    pub per: PerBand,
    pub pbr: PbrBand,
}

/// Tier plus the fields that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub tier: RatingTier,
    pub signals: RatingSignals,
    pub dcf_vote: Vote,
    pub asset_vote: Vote,
    pub earnings_vote: Vote,
    /// Sum of the three votes, -3..=3
    pub total_score: i8,
    /// Factor that settled the tier; None for a Hold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deciding_factor: Option<RatingFactor>,
    /// Net cash / market cap, full precision
    pub net_cash_to_market_cap: Rate,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Band the raw metrics.
pub fn classify(
    per_forecast: &Metric,
    pbr: &Metric,
    net_cash_to_market_cap: Rate,
    dcf_upside_pct: Percent,
    config: &RatingConfig,
) -> RatingSignals {
    let upside = match dcf_upside_pct.cmp(&Decimal::ZERO) {
        std::cmp::Ordering::Greater => UpsideBand::Positive,
        std::cmp::Ordering::Equal => UpsideBand::Flat,
        std::cmp::Ordering::Less => UpsideBand::Negative,
    };

    let assets = if net_cash_to_market_cap >= config.net_cash_rich_ratio {
        AssetBand::Rich
    } else if net_cash_to_market_cap >= Decimal::ZERO {
        AssetBand::Neutral
    } else {
        AssetBand::Indebted
    };

    let per = match per_forecast.value() {
        None => PerBand::NotApplicable,
        Some(v) if v < config.per_cheap => PerBand::Cheap,
        Some(v) if v > config.per_expensive => PerBand::Expensive,
        Some(_) => PerBand::Fair,
    };

    let pbr = match pbr.value() {
        None => PbrBand::NotApplicable,
        Some(v) if v < config.pbr_cheap => PbrBand::BelowBook,
        Some(v) if v > config.pbr_expensive => PbrBand::Rich,
        Some(_) => PbrBand::Fair,
    };

    RatingSignals {
        upside,
        assets,
        per,
        pbr,
    }
}

/// Map banded signals to a tier. Pure and total.
pub fn synthesize(signals: &RatingSignals, net_cash_to_market_cap: Rate) -> Rating {
    let dcf_vote = match signals.upside {
        UpsideBand::Positive => Vote::Bullish,
        UpsideBand::Flat => Vote::Neutral,
        UpsideBand::Negative => Vote::Bearish,
    };
    let asset_vote = match signals.assets {
        AssetBand::Rich => Vote::Bullish,
        AssetBand::Neutral => Vote::Neutral,
        AssetBand::Indebted => Vote::Bearish,
    };
    let per_score = match signals.per {
        PerBand::Cheap => 1,
        PerBand::Fair => 0,
        PerBand::Expensive | PerBand::NotApplicable => -1,
    };
    let pbr_score = match signals.pbr {
        PbrBand::BelowBook => 1,
        PbrBand::Fair => 0,
        PbrBand::Rich | PbrBand::NotApplicable => -1,
    };
    let earnings_vote = Vote::from_score(per_score + pbr_score);

    let ordered = [
        (RatingFactor::DcfUpside, dcf_vote),
        (RatingFactor::AssetBacking, asset_vote),
        (RatingFactor::EarningsMultiple, earnings_vote),
    ];
    let total_score: i8 = ordered.iter().map(|(_, v)| v.score()).sum();
    let leading = ordered.iter().find(|(_, v)| *v != Vote::Neutral).copied();

    let tier = match total_score {
        3 => RatingTier::StrongBuy,
        2 => RatingTier::Buy,
        -2 => RatingTier::Avoid,
        -3 => RatingTier::StrongAvoid,
        1 if matches!(leading, Some((_, Vote::Bullish))) => RatingTier::Buy,
        -1 if matches!(leading, Some((_, Vote::Bearish))) => RatingTier::Avoid,
        _ => RatingTier::Hold,
    };

    let direction = match tier {
        RatingTier::StrongBuy | RatingTier::Buy => Some(Vote::Bullish),
        RatingTier::Avoid | RatingTier::StrongAvoid => Some(Vote::Bearish),
        RatingTier::Hold => None,
    };
    let deciding_factor = direction.and_then(|dir| {
        ordered
            .iter()
            .find(|(_, v)| *v == dir)
            .map(|(factor, _)| *factor)
    });

    let summary = format!(
        "{tier}: DCF upside {:?}, asset backing {:?}, PER {:?}, PBR {:?} (score {total_score:+})",
        signals.upside, signals.assets, signals.per, signals.pbr
    );

    Rating {
        tier,
        signals: *signals,
        dcf_vote,
        asset_vote,
        earnings_vote,
        total_score,
        deciding_factor,
        net_cash_to_market_cap,
        summary,
    }
}

/// Band and synthesize in one step.
pub fn rate(
    per_forecast: &Metric,
    pbr: &Metric,
    net_cash: Money,
    market_cap: Money,
    dcf_upside_pct: Percent,
    config: &RatingConfig,
) -> EngineResult<Rating> {
    // Market cap is positive: price and share count are validated upstream.
    let ratio = net_cash
        .checked_div(market_cap)
        .ok_or_else(|| ValuationError::out_of_range("net_cash", "Net cash to market cap"))?;
    let signals = classify(per_forecast, pbr, ratio, dcf_upside_pct, config);
    Ok(synthesize(&signals, ratio))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
