//! Raw NSE option-chain JSON → normalized [`ChainSnapshot`].
//!
//! The exchange payload is permissive: per-side blocks can be absent,
//! numeric fields can be missing or null. Everything defaults to zero on
//! the way in; only a chain with no underlying, no expiries, or no rows
//! for the nearest expiry is rejected.

use crate::FetchError;
use option_pulse_core::{ChainSnapshot, OptionQuote, StrikeRow};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level NSE option-chain payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptionChain {
    #[serde(default)]
    pub records: RawRecords,
}

/// `records` block of the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecords {
    #[serde(rename = "underlyingValue")]
    pub underlying_value: Option<f64>,
    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,
    #[serde(default)]
    pub data: Vec<RawStrikeEntry>,
}

/// One strike/expiry entry of `records.data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStrikeEntry {
    #[serde(rename = "strikePrice", default)]
    pub strike_price: f64,
    #[serde(rename = "expiryDate", default)]
    pub expiry_date: String,
    #[serde(rename = "CE")]
    pub ce: Option<RawQuote>,
    #[serde(rename = "PE")]
    pub pe: Option<RawQuote>,
}

/// Per-side quote block. Field names follow the exchange exactly,
/// including the lowercase "in" of `changeinOpenInterest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "openInterest", default)]
    pub open_interest: f64,
    #[serde(rename = "changeinOpenInterest", default)]
    pub change_in_open_interest: f64,
    #[serde(rename = "totalTradedVolume", default)]
    pub total_traded_volume: f64,
    #[serde(rename = "impliedVolatility", default)]
    pub implied_volatility: f64,
    #[serde(rename = "lastPrice", default)]
    pub last_price: f64,
}

impl RawQuote {
    fn normalize(&self) -> OptionQuote {
        OptionQuote {
            oi: self.open_interest.max(0.0) as u64,
            coi: self.change_in_open_interest as i64,
            ltp: self.last_price,
            iv: self.implied_volatility,
            volume: self.total_traded_volume.max(0.0) as u64,
        }
    }
}

/// Reduces a raw payload to the nearest-expiry [`ChainSnapshot`].
///
/// # Errors
/// Returns [`FetchError::Malformed`] when the payload lacks an underlying
/// price, any expiry, or any row for the nearest expiry.
pub fn parse_chain(symbol: &str, raw: &RawOptionChain) -> Result<ChainSnapshot, FetchError> {
    let malformed = |reason: &'static str| FetchError::Malformed {
        symbol: symbol.to_string(),
        reason,
    };

    let underlying = raw
        .records
        .underlying_value
        .ok_or_else(|| malformed("missing underlying value"))?;
    let expiry = raw
        .records
        .expiry_dates
        .first()
        .ok_or_else(|| malformed("no expiry dates"))?
        .clone();

    let mut by_strike: BTreeMap<i64, StrikeRow> = BTreeMap::new();
    for entry in &raw.records.data {
        if entry.expiry_date != expiry {
            continue;
        }
        let strike = entry.strike_price.round() as i64;
        let row = by_strike.entry(strike).or_insert_with(|| StrikeRow {
            strike,
            ..StrikeRow::default()
        });
        if let Some(ce) = &entry.ce {
            row.call = ce.normalize();
        }
        if let Some(pe) = &entry.pe {
            row.put = pe.normalize();
        }
    }

    if by_strike.is_empty() {
        return Err(malformed("no rows for nearest expiry"));
    }

    Ok(ChainSnapshot {
        symbol: symbol.to_string(),
        underlying,
        expiry,
        rows: by_strike.into_values().collect(),
    })
}

// =============================================================================
// Tests
// =============================================================================
