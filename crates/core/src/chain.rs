//! Normalized option-chain model.
//!
//! A [`ChainSnapshot`] is one expiry's worth of strike rows for a symbol,
//! already reduced from the exchange's raw payload. The engine operates on
//! a [`ChainWindow`], the at-the-money neighborhood of a snapshot.

use serde::{Deserialize, Serialize};

/// Option side: call (CE) or put (PE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Call option (right to buy), exchange code "CE".
    #[serde(rename = "CE")]
    Call,
    /// Put option (right to sell), exchange code "PE".
    #[serde(rename = "PE")]
    Put,
}

impl Side {
    /// Returns the exchange code for this side.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-side quote fields for a single strike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Outstanding open interest.
    pub oi: u64,
    /// Change in open interest since the prior session print.
    pub coi: i64,
    /// Last traded price.
    pub ltp: f64,
    /// Implied volatility (percent).
    pub iv: f64,
    /// Traded volume for the session.
    pub volume: u64,
}

impl OptionQuote {
    /// Crude per-side buildup aggregate: `oi + coi + volume`.
    ///
    /// Used only for the detailed per-strike export, not for scoring.
    #[must_use]
    pub fn strength(&self) -> i64 {
        self.oi as i64 + self.coi + self.volume as i64
    }
}

/// One strike row carrying both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    /// Strike price (integer, as quoted by the exchange).
    pub strike: i64,
    /// Call-side quote.
    pub call: OptionQuote,
    /// Put-side quote.
    pub put: OptionQuote,
}

impl StrikeRow {
    /// Returns the quote for the requested side.
    #[must_use]
    pub fn quote(&self, side: Side) -> &OptionQuote {
        match side {
            Side::Call => &self.call,
            Side::Put => &self.put,
        }
    }

    /// Combined call+put open interest at this strike.
    #[must_use]
    pub fn combined_oi(&self) -> u64 {
        self.call.oi + self.put.oi
    }
}

/// One expiry's option chain for a symbol, rows sorted by strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Underlying symbol.
    pub symbol: String,
    /// Current underlying price.
    pub underlying: f64,
    /// Expiry date string as reported by the exchange.
    pub expiry: String,
    /// Strike rows, ascending by strike.
    pub rows: Vec<StrikeRow>,
}

impl ChainSnapshot {
    /// Whole-chain put/call open-interest ratio.
    ///
    /// Returns 0.0 when there is no call open interest at all.
    #[must_use]
    pub fn put_call_ratio(&self) -> f64 {
        let ce_oi: u64 = self.rows.iter().map(|r| r.call.oi).sum();
        let pe_oi: u64 = self.rows.iter().map(|r| r.put.oi).sum();
        if ce_oi == 0 {
            0.0
        } else {
            pe_oi as f64 / ce_oi as f64
        }
    }

    /// The strike nearest the current underlying price.
    ///
    /// Returns `None` for an empty chain.
    #[must_use]
    pub fn atm_strike(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.strike).min_by(|a, b| {
            let da = (*a as f64 - self.underlying).abs();
            let db = (*b as f64 - self.underlying).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Extracts the ATM ± `n` strike window, clamped at the chain edges.
    ///
    /// Returns `None` when the chain has no rows.
    #[must_use]
    pub fn window(&self, n: usize) -> Option<ChainWindow> {
        let atm = self.atm_strike()?;
        let atm_index = self.rows.iter().position(|r| r.strike == atm)?;
        let start = atm_index.saturating_sub(n);
        let end = (atm_index + n + 1).min(self.rows.len());
        let rows: Vec<StrikeRow> = self.rows[start..end].to_vec();
        Some(ChainWindow {
            symbol: self.symbol.clone(),
            underlying: self.underlying,
            expiry: self.expiry.clone(),
            atm_strike: atm,
            rows,
        })
    }
}

/// The at-the-money neighborhood of a chain: ATM ± N strikes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainWindow {
    /// Underlying symbol.
    pub symbol: String,
    /// Current underlying price.
    pub underlying: f64,
    /// Expiry date string.
    pub expiry: String,
    /// The at-the-money strike.
    pub atm_strike: i64,
    /// Window rows, ascending by strike.
    pub rows: Vec<StrikeRow>,
}

impl ChainWindow {
    /// Strikes covered by this window.
    #[must_use]
    pub fn strikes(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.strike).collect()
    }

    /// Local put/call open-interest ratio over the window only.
    ///
    /// Returns 0.0 when the window has no call open interest.
    #[must_use]
    pub fn local_oi_ratio(&self) -> f64 {
        let ce_oi: u64 = self.rows.iter().map(|r| r.call.oi).sum();
        let pe_oi: u64 = self.rows.iter().map(|r| r.put.oi).sum();
        if ce_oi == 0 {
            0.0
        } else {
            pe_oi as f64 / ce_oi as f64
        }
    }
}
