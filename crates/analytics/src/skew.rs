//! At-the-money implied-volatility skew.

use option_pulse_core::ChainSnapshot;

/// Call IV minus put IV at the strike nearest the underlying.
///
/// Positive skew means calls are pricing richer volatility than puts.
/// Returns 0.0 for an empty chain.
#[must_use]
pub fn atm_iv_skew(chain: &ChainSnapshot) -> f64 {
    let Some(atm) = chain.atm_strike() else {
        return 0.0;
    };
    chain
        .rows
        .iter()
        .find(|r| r.strike == atm)
        .map_or(0.0, |r| r.call.iv - r.put.iv)
}
