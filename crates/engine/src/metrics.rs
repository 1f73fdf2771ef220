//! Incremental per-strike metric computations.
//!
//! Every function here is pure over (prior state, current observation):
//! feeding the same pair always yields the same derived value, so the
//! engine can be re-run without committing and nothing changes. State only
//! advances when the returned contribution is inserted into the
//! next-generation snapshot by the caller.
//!
//! Degenerate inputs (no prior, zero volume, undefined VWAP) yield neutral
//! zero metrics rather than errors.

use crate::snapshot::StrikeState;
use chrono::{DateTime, Utc};

/// Minimum elapsed time between generations, in minutes.
///
/// Clamping avoids unbounded OI-velocity amplification when cycles run
/// seconds apart.
pub const MIN_ELAPSED_MINUTES: f64 = 1.0;

/// Rounds to the given number of decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Underlying price trend vs the prior generation, in percent.
///
/// Rounded to 4 decimals; 0 when there is no usable prior price.
#[must_use]
pub fn price_trend_pct(prev_underlying: Option<f64>, underlying: f64) -> f64 {
    match prev_underlying {
        Some(prev) if prev > 0.0 => round_to((underlying - prev) / prev * 100.0, 4),
        _ => 0.0,
    }
}

/// Incremental EMA update with `alpha = 2 / (period + 1)`.
///
/// The first observation seeds the EMA with the raw price, no smoothing.
#[must_use]
pub fn ema_update(prev_ema: Option<f64>, price: f64, period: u32) -> f64 {
    match prev_ema {
        Some(prev) => {
            let alpha = 2.0 / (f64::from(period) + 1.0);
            alpha * price + (1.0 - alpha) * prev
        }
        None => price,
    }
}

/// Lifetime VWAP from the accumulators; undefined until volume is seen.
#[must_use]
pub fn vwap(cum_vwap_num: f64, cum_vol: u64) -> Option<f64> {
    if cum_vol > 0 {
        Some(cum_vwap_num / cum_vol as f64)
    } else {
        None
    }
}

/// Deviation of the price from VWAP, in percent; 0 when VWAP is undefined.
#[must_use]
pub fn vwap_deviation_pct(price: f64, vwap: Option<f64>) -> f64 {
    match vwap {
        Some(v) if v != 0.0 => round_to((price - v) / v * 100.0, 4),
        _ => 0.0,
    }
}

/// Implied-volatility change vs the prior observation; 0 on a cold start.
#[must_use]
pub fn iv_delta(prev_iv: Option<f64>, iv_now: f64) -> f64 {
    match prev_iv {
        Some(prev) => round_to(iv_now - prev, 6),
        None => 0.0,
    }
}

/// Change-in-open-interest velocity, contracts per elapsed minute.
///
/// Neutral (0) when either the prior COI baseline or the elapsed time is
/// unknown; the caller still records the current COI as the new baseline.
#[must_use]
pub fn oi_velocity(prev_coi: Option<i64>, coi_now: i64, elapsed_minutes: Option<f64>) -> f64 {
    match (prev_coi, elapsed_minutes) {
        (Some(prev), Some(minutes)) if minutes > 0.0 => {
            round_to((coi_now - prev) as f64 / minutes, 4)
        }
        _ => 0.0,
    }
}

/// Wall-clock minutes since the prior generation, clamped to
/// [`MIN_ELAPSED_MINUTES`]; `None` when there is no prior timestamp.
#[must_use]
pub fn elapsed_minutes(prev: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    prev.map(|ts| {
        let minutes = (now - ts).num_milliseconds() as f64 / 60_000.0;
        minutes.max(MIN_ELAPSED_MINUTES)
    })
}

/// One strike's observation for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeObservation {
    /// Option last traded price.
    pub ltp: f64,
    /// Implied volatility.
    pub iv: f64,
    /// Traded volume.
    pub volume: u64,
    /// Change in open interest.
    pub coi: i64,
}

/// Per-strike deltas derived by [`observe_strike`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeDeltas {
    /// EMA before this observation, if the strike had history.
    pub ema_prev: Option<f64>,
    /// EMA after this observation.
    pub ema_new: f64,
    /// `ema_new - ema_prev`; 0 on a cold start.
    pub ema_delta: f64,
    /// Lifetime VWAP including this observation, if defined.
    pub vwap: Option<f64>,
    /// LTP deviation from VWAP in percent; 0 when VWAP is undefined.
    pub vwap_dev_pct: f64,
    /// IV change vs the prior generation; 0 on a cold start.
    pub iv_delta: f64,
    /// COI rate per elapsed minute; 0 without a baseline.
    pub oi_velocity: f64,
}

/// The atomic compute-and-record step for one strike.
///
/// Derives every per-strike metric from the prior state and the current
/// observation, and returns the complete next-generation [`StrikeState`]
/// the caller must record. A strike with no prior state cold-starts:
/// all deltas are neutral zero and the observation becomes the baseline.
#[must_use]
pub fn observe_strike(
    prior: Option<&StrikeState>,
    obs: &StrikeObservation,
    ema_period: u32,
    elapsed: Option<f64>,
) -> (StrikeDeltas, StrikeState) {
    let ema_prev = prior.and_then(|s| s.ema_ltp);
    let ema_new = ema_update(ema_prev, obs.ltp, ema_period);
    let ema_delta = match ema_prev {
        Some(prev) => round_to(ema_new - prev, 6),
        None => 0.0,
    };

    let prior_cum_num = prior.map_or(0.0, |s| s.cum_vwap_num);
    let prior_cum_vol = prior.map_or(0, |s| s.cum_vol);
    let cum_vwap_num = prior_cum_num + obs.ltp * obs.volume as f64;
    let cum_vol = prior_cum_vol + obs.volume;
    let vwap_now = vwap(cum_vwap_num, cum_vol);
    let vwap_dev_pct = vwap_deviation_pct(obs.ltp, vwap_now);

    let iv_prev = prior.and_then(|s| s.iv);
    let iv_delta = iv_delta(iv_prev, obs.iv);

    let coi_prev = prior.and_then(|s| s.coi);
    let oi_velocity = oi_velocity(coi_prev, obs.coi, elapsed);

    let deltas = StrikeDeltas {
        ema_prev,
        ema_new,
        ema_delta,
        vwap: vwap_now,
        vwap_dev_pct,
        iv_delta,
        oi_velocity,
    };

    let next = StrikeState {
        ema_ltp: Some(ema_new),
        cum_vwap_num,
        cum_vol,
        iv: Some(obs.iv),
        coi: Some(obs.coi),
    };

    (deltas, next)
}

// =============================================================================
// Tests
// =============================================================================
