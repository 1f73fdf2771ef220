//! Best-strike selection for a decided side.
//!
//! Every eligible strike in the ATM window is scored through the metric
//! engine; the compute-and-record step is atomic per strike, so the
//! next-generation state contribution for a strike is written in the same
//! pass that derives its deltas.

use crate::metrics::{observe_strike, StrikeObservation};
use crate::scorer::composite_score;
use crate::snapshot::SymbolState;
use option_pulse_core::{Candidate, ChainWindow, EngineConfig, Side, StrikeMetrics};
use tracing::debug;

/// Liquidity gate applied before scoring.
///
/// A candidate is dropped only when its own-side volume is thin AND the
/// strike's combined call+put open interest is too small to trust.
#[must_use]
pub fn passes_liquidity(own_volume: u64, combined_oi: u64, config: &EngineConfig) -> bool {
    own_volume >= config.min_candidate_volume || combined_oi >= config.min_combined_oi
}

/// Scores every surviving strike of `window` for `side` and returns the
/// best candidate.
///
/// The winner has the maximum composite score; ties break toward higher
/// traded volume. Returns `None` when no strike survives the liquidity
/// filter.
///
/// Each survivor's next-generation [`crate::snapshot::StrikeState`] is
/// recorded into `next` as it is scored.
pub fn select_candidate(
    window: &ChainWindow,
    side: Side,
    price_trend_pct: f64,
    prior: Option<&SymbolState>,
    next: &mut SymbolState,
    elapsed_minutes: Option<f64>,
    config: &EngineConfig,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for row in &window.rows {
        let quote = row.quote(side);

        if !passes_liquidity(quote.volume, row.combined_oi(), config) {
            debug!(
                symbol = %window.symbol,
                strike = row.strike,
                side = %side,
                volume = quote.volume,
                combined_oi = row.combined_oi(),
                "Dropped illiquid candidate"
            );
            continue;
        }

        let observation = StrikeObservation {
            ltp: quote.ltp,
            iv: quote.iv,
            volume: quote.volume,
            coi: quote.coi,
        };
        let prior_strike = prior.and_then(|s| s.strike(row.strike));
        let (deltas, state) = observe_strike(
            prior_strike,
            &observation,
            config.ema_period,
            elapsed_minutes,
        );
        next.strikes.insert(row.strike, state);

        let metrics = StrikeMetrics {
            price_trend_pct,
            ema_prev: deltas.ema_prev,
            ema_new: deltas.ema_new,
            ema_delta: deltas.ema_delta,
            vwap: deltas.vwap,
            vwap_dev_pct: deltas.vwap_dev_pct,
            iv_delta: deltas.iv_delta,
            iv_now: quote.iv,
            oi_velocity: deltas.oi_velocity,
            ltp: quote.ltp,
            volume: quote.volume,
            coi: quote.coi,
        };
        let score = composite_score(&metrics, &config.weights, &config.bounds);

        let candidate = Candidate {
            strike: row.strike,
            side,
            ltp: quote.ltp,
            iv: quote.iv,
            volume: quote.volume,
            oi: quote.oi,
            coi: quote.coi,
            score,
            metrics,
        };

        let better = match &best {
            None => true,
            Some(current) => {
                candidate.score > current.score
                    || (candidate.score == current.score && candidate.volume > current.volume)
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    best
}

// =============================================================================
// Tests
// =============================================================================
