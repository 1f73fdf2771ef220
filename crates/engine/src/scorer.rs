//! Composite scoring of a strike's metric bundle.
//!
//! Each raw metric is clamped to its configured domain and divided down to
//! [-1, 1], then combined by the fixed weight table. The IV term is
//! sign-inverted: falling implied volatility favors option buyers. The
//! weighted sum is scaled to roughly [-100, 100].

use crate::metrics::round_to;
use option_pulse_core::{NormBounds, ScoreWeights, StrikeMetrics};

/// Clamps `value` to ±`bound` and normalizes into [-1, 1].
///
/// A non-positive bound disables the term (contributes 0).
#[must_use]
pub fn clamp_norm(value: f64, bound: f64) -> f64 {
    if bound <= 0.0 {
        return 0.0;
    }
    value.clamp(-bound, bound) / bound
}

/// Computes the composite score for one candidate's metrics.
///
/// Returns the weighted sum of normalized sub-scores scaled by 100 and
/// rounded to 2 decimals.
#[must_use]
pub fn composite_score(metrics: &StrikeMetrics, weights: &ScoreWeights, bounds: &NormBounds) -> f64 {
    let pt = clamp_norm(metrics.price_trend_pct, bounds.price_trend_pct);
    let ed = clamp_norm(metrics.ema_delta, bounds.ema_delta);
    let vd = clamp_norm(metrics.vwap_dev_pct, bounds.vwap_dev_pct);
    // Rising IV hurts buyers; invert so falling IV scores positive.
    let ivd = -clamp_norm(metrics.iv_delta, bounds.iv_delta);
    let oi = clamp_norm(metrics.oi_velocity, bounds.oi_velocity);

    let combined = weights.price_trend * pt
        + weights.ema_momentum * ed
        + weights.vwap_dev * vd
        + weights.iv_trend * ivd
        + weights.oi_velocity * oi;

    round_to(combined * 100.0, 2)
}

// =============================================================================
// Tests
// =============================================================================
