//! Signal output types.
//!
//! These are the in-memory structures the engine returns to its caller;
//! file/CSV serialization is the sink's concern.

use crate::chain::{Side, StrikeRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strength label attached to a fired signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
}

impl SignalLabel {
    /// Returns true for the buy-side labels.
    #[must_use]
    pub const fn is_buy(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    /// Returns true for the sell-side labels.
    #[must_use]
    pub const fn is_sell(self) -> bool {
        !self.is_buy()
    }
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        };
        f.write_str(s)
    }
}

/// Full metric bundle computed for one strike candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeMetrics {
    /// Underlying price trend vs the prior generation, percent.
    pub price_trend_pct: f64,
    /// EMA of the option LTP before this observation, if any.
    pub ema_prev: Option<f64>,
    /// EMA of the option LTP after this observation.
    pub ema_new: f64,
    /// `ema_new - ema_prev`; 0 on a cold start.
    pub ema_delta: f64,
    /// Lifetime volume-weighted average price, if defined.
    pub vwap: Option<f64>,
    /// Deviation of the LTP from VWAP, percent; 0 when VWAP is undefined.
    pub vwap_dev_pct: f64,
    /// Implied-volatility change vs the prior generation; 0 on a cold start.
    pub iv_delta: f64,
    /// Implied volatility observed this cycle.
    pub iv_now: f64,
    /// Change-in-open-interest rate per elapsed minute since the prior run.
    pub oi_velocity: f64,
    /// Last traded price observed this cycle.
    pub ltp: f64,
    /// Traded volume observed this cycle.
    pub volume: u64,
    /// Change in open interest observed this cycle.
    pub coi: i64,
}

/// A scored strike candidate, ephemeral to one selection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub strike: i64,
    pub side: Side,
    pub ltp: f64,
    pub iv: f64,
    pub volume: u64,
    pub oi: u64,
    pub coi: i64,
    pub score: f64,
    pub metrics: StrikeMetrics,
}

/// One fired signal for a symbol in a polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub label: SignalLabel,
    pub side: Side,
    pub strike: i64,
    pub atm_strike: i64,
    /// Absolute distance between the chosen strike and the ATM strike.
    pub distance_from_atm: i64,
    pub ltp: f64,
    pub oi: u64,
    pub coi: i64,
    pub volume: u64,
    pub iv: f64,
    pub score: f64,
    pub metrics: StrikeMetrics,
    /// Whole-chain put/call open-interest ratio.
    pub pcr: f64,
    /// Put/call open-interest ratio over the ATM window.
    pub oi_ratio: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-symbol cycle summary, sufficient to build a dashboard row and the
/// detailed per-strike export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub underlying: f64,
    pub atm_strike: i64,
    /// Strikes covered by the analyzed window.
    pub strikes_analyzed: Vec<i64>,
    /// The window rows as observed this cycle.
    pub rows: Vec<StrikeRow>,
    /// Label of the fired signal, if one fired.
    pub label: Option<SignalLabel>,
    pub timestamp: DateTime<Utc>,
}

/// Everything one polling cycle produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    /// All fired signals, in symbol processing order.
    pub signals: Vec<Signal>,
    /// Buy-side signals ranked by score, best first, truncated to top-N.
    pub top_buys: Vec<Signal>,
    /// Sell-side signals ranked by score, best first, truncated to top-N.
    pub top_sells: Vec<Signal>,
    /// One summary per successfully processed symbol.
    pub summaries: Vec<SymbolSummary>,
}
