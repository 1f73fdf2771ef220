//! Option LTP stickiness vs elasticity at key strikes.
//!
//! Compares the price change an option "should" have shown for the spot
//! move (moneyness-heuristic delta × spot change) against the change it
//! actually printed. Sticky options lag their expected move and are
//! fade candidates; super-elastic ones overshoot and mark squeeze risk.
//!
//! The delta estimate is a moneyness heuristic, not a pricing-model
//! Greek; it must not be used as a risk number.

use option_pulse_core::{ChainSnapshot, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunables for the elasticity classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticityConfig {
    /// Ratio below which an option is called sticky.
    pub sensitivity_threshold: f64,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            sensitivity_threshold: 0.3,
        }
    }
}

/// How an option's actual move compares to its expected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElasticityClass {
    /// Barely responding to the spot move.
    Sticky,
    Normal,
    /// Moving more than expected.
    Elastic,
    /// Overshooting hard; gamma-squeeze territory.
    SuperElastic,
}

/// Elasticity assessment for one (strike, side) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeElasticity {
    pub strike: i64,
    pub side: Side,
    pub ltp: f64,
    /// Heuristic delta used for the expected move.
    pub delta: f64,
    pub iv: f64,
    /// `delta × spot_change_pct`.
    pub expected_change_pct: f64,
    /// LTP change vs the caller-supplied prior print, percent.
    pub actual_change_pct: f64,
    /// `actual / expected`; 1.0 when no move was expected.
    pub ratio: f64,
    pub class: ElasticityClass,
    pub is_itm: bool,
}

/// Full elasticity report over the requested strikes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticityReport {
    pub entries: Vec<StrikeElasticity>,
    /// Sticky entries (fade candidates).
    pub sticky_zones: Vec<StrikeElasticity>,
    /// Elastic and super-elastic entries (squeeze risk).
    pub elastic_zones: Vec<StrikeElasticity>,
    /// Share of ITM/near-spot entries that are super-elastic, in [0, 1].
    pub gamma_risk: f64,
}

/// Moneyness-heuristic delta: ITM 0.7, ATM 0.5, OTM 0.3, negated for
/// puts, scaled down as IV rises above 50.
#[must_use]
pub fn estimate_delta(strike: i64, spot: f64, iv: f64, side: Side) -> f64 {
    let strike_f = strike as f64;
    let base = match side {
        Side::Call => {
            if strike_f < spot {
                0.7
            } else if strike_f == spot {
                0.5
            } else {
                0.3
            }
        }
        Side::Put => {
            if strike_f > spot {
                -0.7
            } else if strike_f == spot {
                -0.5
            } else {
                -0.3
            }
        }
    };

    let iv_factor = 1.0 + (50.0 - iv) / 100.0;
    base * iv_factor
}

/// Classifies an elasticity ratio.
#[must_use]
pub fn classify_ratio(ratio: f64, sensitivity_threshold: f64) -> ElasticityClass {
    if ratio < sensitivity_threshold {
        ElasticityClass::Sticky
    } else if ratio > 2.0 {
        ElasticityClass::SuperElastic
    } else if ratio > 1.0 {
        ElasticityClass::Elastic
    } else {
        ElasticityClass::Normal
    }
}

/// Analyzes elasticity at `key_strikes` of the chain.
///
/// `prior_ltps` holds the previous LTP print per (strike, side); pairs
/// without a prior read as zero actual change. `spot_change_pct` is the
/// underlying's move since that prior print.
#[must_use]
pub fn analyze(
    chain: &ChainSnapshot,
    spot_change_pct: f64,
    prior_ltps: &HashMap<(i64, Side), f64>,
    key_strikes: &[i64],
    config: &ElasticityConfig,
) -> ElasticityReport {
    let mut entries = Vec::new();

    for row in &chain.rows {
        if !key_strikes.contains(&row.strike) {
            continue;
        }
        for side in [Side::Call, Side::Put] {
            let quote = row.quote(side);
            let delta = estimate_delta(row.strike, chain.underlying, quote.iv, side);
            let expected_change_pct = delta * spot_change_pct;

            let actual_change_pct = match prior_ltps.get(&(row.strike, side)) {
                Some(prev) => (quote.ltp - prev) / prev.max(0.01) * 100.0,
                None => 0.0,
            };

            let ratio = if expected_change_pct != 0.0 {
                actual_change_pct / expected_change_pct
            } else {
                1.0
            };

            let strike_f = row.strike as f64;
            let is_itm = match side {
                Side::Call => strike_f < chain.underlying,
                Side::Put => strike_f > chain.underlying,
            };

            entries.push(StrikeElasticity {
                strike: row.strike,
                side,
                ltp: quote.ltp,
                delta,
                iv: quote.iv,
                expected_change_pct,
                actual_change_pct,
                ratio,
                class: classify_ratio(ratio, config.sensitivity_threshold),
                is_itm,
            });
        }
    }

    let sticky_zones: Vec<StrikeElasticity> = entries
        .iter()
        .filter(|e| e.class == ElasticityClass::Sticky)
        .cloned()
        .collect();
    let elastic_zones: Vec<StrikeElasticity> = entries
        .iter()
        .filter(|e| matches!(e.class, ElasticityClass::Elastic | ElasticityClass::SuperElastic))
        .cloned()
        .collect();
    let gamma_risk = gamma_risk(&entries, chain.underlying);

    ElasticityReport {
        entries,
        sticky_zones,
        elastic_zones,
        gamma_risk,
    }
}

/// Share of ITM or near-spot entries that are super-elastic.
fn gamma_risk(entries: &[StrikeElasticity], spot: f64) -> f64 {
    let mut total = 0u32;
    let mut super_elastic = 0u32;

    for entry in entries {
        if entry.is_itm || (entry.strike as f64 - spot).abs() < 100.0 {
            total += 1;
            if entry.class == ElasticityClass::SuperElastic {
                super_elastic += 1;
            }
        }
    }

    if total > 0 {
        f64::from(super_elastic) / f64::from(total)
    } else {
        0.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use option_pulse_core::{OptionQuote, StrikeRow};

    fn row(strike: i64, ce_ltp: f64, pe_ltp: f64, iv: f64) -> StrikeRow {
        StrikeRow {
            strike,
            call: OptionQuote {
                oi: 100,
                coi: 0,
                ltp: ce_ltp,
                iv,
                volume: 10,
            },
            put: OptionQuote {
                oi: 100,
                coi: 0,
                ltp: pe_ltp,
                iv,
                volume: 10,
            },
        }
    }

    fn chain(spot: f64, rows: Vec<StrikeRow>) -> ChainSnapshot {
        ChainSnapshot {
            symbol: "NIFTY".to_string(),
            underlying: spot,
            expiry: "30-Jan-2025".to_string(),
            rows,
        }
    }

    // =========================================================================
    // Delta-Heuristic Tests
    // =========================================================================

    #[test]
    fn itm_call_delta_larger_than_otm() {
        // iv 50 keeps the factor at exactly 1.0.
        let itm = estimate_delta(900, 1000.0, 50.0, Side::Call);
        let otm = estimate_delta(1100, 1000.0, 50.0, Side::Call);

        assert!((itm - 0.7).abs() < f64::EPSILON);
        assert!((otm - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn put_delta_is_negative_and_mirrored() {
        let itm = estimate_delta(1100, 1000.0, 50.0, Side::Put);
        let otm = estimate_delta(900, 1000.0, 50.0, Side::Put);

        assert!((itm - (-0.7)).abs() < f64::EPSILON);
        assert!((otm - (-0.3)).abs() < f64::EPSILON);
    }

    #[test]
    fn high_iv_shrinks_delta_magnitude() {
        let calm = estimate_delta(900, 1000.0, 20.0, Side::Call); // factor 1.3
        let wild = estimate_delta(900, 1000.0, 80.0, Side::Call); // factor 0.7

        assert!(calm > wild);
        assert!((calm - 0.91).abs() < 1e-12);
        assert!((wild - 0.49).abs() < 1e-12);
    }

    // =========================================================================
    // Classification Tests
    // =========================================================================

    #[test]
    fn ratio_classes_have_expected_breakpoints() {
        assert_eq!(classify_ratio(0.1, 0.3), ElasticityClass::Sticky);
        assert_eq!(classify_ratio(0.8, 0.3), ElasticityClass::Normal);
        assert_eq!(classify_ratio(1.5, 0.3), ElasticityClass::Elastic);
        assert_eq!(classify_ratio(2.5, 0.3), ElasticityClass::SuperElastic);
    }

    #[test]
    fn ratio_exactly_one_is_normal() {
        assert_eq!(classify_ratio(1.0, 0.3), ElasticityClass::Normal);
    }

    // =========================================================================
    // Analyze Tests
    // =========================================================================

    #[test]
    fn no_prior_ltp_reads_as_zero_actual_change() {
        let c = chain(1000.0, vec![row(900, 110.0, 2.0, 50.0)]);

        let report = analyze(
            &c,
            1.0,
            &HashMap::new(),
            &[900],
            &ElasticityConfig::default(),
        );

        let call = report
            .entries
            .iter()
            .find(|e| e.side == Side::Call)
            .unwrap();
        assert!((call.actual_change_pct - 0.0).abs() < f64::EPSILON);
        // Expected 0.7% move, actual 0 -> ratio 0 -> sticky.
        assert_eq!(call.class, ElasticityClass::Sticky);
    }

    #[test]
    fn overshooting_option_is_super_elastic() {
        let c = chain(1000.0, vec![row(900, 110.0, 2.0, 50.0)]);
        let mut priors = HashMap::new();
        // Prior 100 -> actual +10% against an expected 0.7% move.
        priors.insert((900, Side::Call), 100.0);

        let report = analyze(&c, 1.0, &priors, &[900], &ElasticityConfig::default());

        let call = report
            .entries
            .iter()
            .find(|e| e.side == Side::Call)
            .unwrap();
        assert!((call.actual_change_pct - 10.0).abs() < f64::EPSILON);
        assert_eq!(call.class, ElasticityClass::SuperElastic);
        assert!(report
            .elastic_zones
            .iter()
            .any(|e| e.strike == 900 && e.side == Side::Call));
    }

    #[test]
    fn zero_expected_move_defaults_ratio_to_one() {
        let c = chain(1000.0, vec![row(900, 110.0, 2.0, 50.0)]);

        let report = analyze(
            &c,
            0.0,
            &HashMap::new(),
            &[900],
            &ElasticityConfig::default(),
        );

        for entry in &report.entries {
            assert!((entry.ratio - 1.0).abs() < f64::EPSILON);
            assert_eq!(entry.class, ElasticityClass::Normal);
        }
    }

    #[test]
    fn strikes_outside_key_list_are_ignored() {
        let c = chain(1000.0, vec![row(900, 110.0, 2.0, 50.0), row(1100, 2.0, 110.0, 50.0)]);

        let report = analyze(
            &c,
            1.0,
            &HashMap::new(),
            &[1100],
            &ElasticityConfig::default(),
        );

        assert_eq!(report.entries.len(), 2); // both sides of strike 1100 only
        assert!(report.entries.iter().all(|e| e.strike == 1100));
    }

    #[test]
    fn gamma_risk_counts_super_elastic_share() {
        let c = chain(1000.0, vec![row(950, 110.0, 2.0, 50.0)]);
        let mut priors = HashMap::new();
        priors.insert((950, Side::Call), 100.0); // ITM call, super elastic
        priors.insert((950, Side::Put), 2.0); // near-spot put, no change -> sticky

        let report = analyze(&c, 1.0, &priors, &[950], &ElasticityConfig::default());

        // ITM call + near-spot put both count; one of two is super elastic.
        assert!((report.gamma_risk - 0.5).abs() < f64::EPSILON);
    }
}
