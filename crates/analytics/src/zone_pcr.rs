//! Zone-level put/call-ratio analysis.
//!
//! The whole-chain PCR hides where the positioning actually sits. These
//! aggregators re-compute the ratio inside bands around spot (near,
//! support below, resistance above) and flag divergence between the
//! near-zone reading and the global one.

use option_pulse_core::ChainSnapshot;
use serde::{Deserialize, Serialize};

/// Band width used for the near/support/resistance zones, in price units.
pub const DEFAULT_ZONE_WIDTH: f64 = 200.0;
/// Half-width of the divergence comparison band around spot.
pub const NEAR_BAND: f64 = 100.0;
/// Divergence beyond which a zone is called PE/CE heavy.
pub const DIVERGENCE_THRESHOLD: f64 = 0.2;
/// Divergence beyond which the global PCR should be faded.
pub const FADE_THRESHOLD: f64 = 0.3;

/// Open-interest totals and ratio inside one price band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneOi {
    pub pcr: f64,
    pub ce_oi: u64,
    pub pe_oi: u64,
    /// Inclusive strike range of the band.
    pub lower: f64,
    pub upper: f64,
}

/// Kind of near-zone vs global divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DivergenceKind {
    /// Localized put buildup near spot despite the balanced overall chain.
    NearZonePeHeavy,
    /// Localized call buildup near spot despite the balanced overall chain.
    NearZoneCeHeavy,
    Balanced,
}

/// What to do with the global PCR given the divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PcrImplication {
    FadeGlobalPcr,
    TrustGlobalPcr,
}

/// Divergence between the near-zone PCR and the global PCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcrDivergence {
    pub global_pcr: f64,
    pub near_zone_pcr: f64,
    pub divergence: f64,
    pub kind: DivergenceKind,
    pub implication: PcrImplication,
}

/// Zone-level PCR report for one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePcrReport {
    pub global_pcr: f64,
    pub near: ZoneOi,
    pub support: ZoneOi,
    pub resistance: ZoneOi,
    pub divergence: PcrDivergence,
}

/// Whole-chain PCR; degrades to 1.0 (neutral) without call OI.
#[must_use]
pub fn global_pcr(chain: &ChainSnapshot) -> f64 {
    let ce_oi: u64 = chain.rows.iter().map(|r| r.call.oi).sum();
    let pe_oi: u64 = chain.rows.iter().map(|r| r.put.oi).sum();
    if ce_oi > 0 {
        pe_oi as f64 / ce_oi as f64
    } else {
        1.0
    }
}

/// OI totals and PCR over strikes in `[lower, upper]`.
#[must_use]
pub fn band_oi(chain: &ChainSnapshot, lower: f64, upper: f64) -> ZoneOi {
    let mut ce_oi = 0u64;
    let mut pe_oi = 0u64;
    for row in &chain.rows {
        let strike = row.strike as f64;
        if strike >= lower && strike <= upper {
            ce_oi += row.call.oi;
            pe_oi += row.put.oi;
        }
    }
    ZoneOi {
        pcr: pe_oi as f64 / ce_oi.max(1) as f64,
        ce_oi,
        pe_oi,
        lower,
        upper,
    }
}

/// Computes the full zone-level report around `spot`.
#[must_use]
pub fn analyze(chain: &ChainSnapshot, spot: f64, zone_width: f64) -> ZonePcrReport {
    ZonePcrReport {
        global_pcr: global_pcr(chain),
        near: band_oi(chain, spot - zone_width, spot + zone_width),
        support: band_oi(chain, spot - 2.0 * zone_width, spot - zone_width),
        resistance: band_oi(chain, spot + zone_width, spot + 2.0 * zone_width),
        divergence: divergence(chain, spot),
    }
}

/// Compares the PCR in the tight band around `spot` against the global PCR.
#[must_use]
pub fn divergence(chain: &ChainSnapshot, spot: f64) -> PcrDivergence {
    let global = global_pcr(chain);
    let near = band_oi(chain, spot - NEAR_BAND, spot + NEAR_BAND);
    let diff = near.pcr - global;

    let kind = if diff > DIVERGENCE_THRESHOLD {
        DivergenceKind::NearZonePeHeavy
    } else if diff < -DIVERGENCE_THRESHOLD {
        DivergenceKind::NearZoneCeHeavy
    } else {
        DivergenceKind::Balanced
    };

    let implication = if diff.abs() > FADE_THRESHOLD {
        PcrImplication::FadeGlobalPcr
    } else {
        PcrImplication::TrustGlobalPcr
    };

    PcrDivergence {
        global_pcr: global,
        near_zone_pcr: near.pcr,
        divergence: diff,
        kind,
        implication,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use option_pulse_core::{OptionQuote, StrikeRow};

    fn row(strike: i64, ce_oi: u64, pe_oi: u64) -> StrikeRow {
        StrikeRow {
            strike,
            call: OptionQuote {
                oi: ce_oi,
                coi: 0,
                ltp: 5.0,
                iv: 12.0,
                volume: 0,
            },
            put: OptionQuote {
                oi: pe_oi,
                coi: 0,
                ltp: 5.0,
                iv: 12.0,
                volume: 0,
            },
        }
    }

    fn chain(rows: Vec<StrikeRow>) -> ChainSnapshot {
        ChainSnapshot {
            symbol: "NIFTY".to_string(),
            underlying: 1000.0,
            expiry: "30-Jan-2025".to_string(),
            rows,
        }
    }

    #[test]
    fn global_pcr_ratio_of_totals() {
        let c = chain(vec![row(900, 100, 200), row(1100, 100, 200)]);
        assert!((global_pcr(&c) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn global_pcr_neutral_without_call_oi() {
        let c = chain(vec![row(900, 0, 200)]);
        assert!((global_pcr(&c) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn band_oi_includes_boundary_strikes() {
        let c = chain(vec![row(800, 10, 20), row(1000, 10, 20), row(1200, 10, 20)]);

        let band = band_oi(&c, 800.0, 1000.0);

        assert_eq!(band.ce_oi, 20);
        assert_eq!(band.pe_oi, 40);
        assert!((band.pcr - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn band_oi_empty_band_uses_unit_denominator() {
        let c = chain(vec![row(800, 10, 20)]);

        let band = band_oi(&c, 2000.0, 3000.0);

        assert_eq!(band.ce_oi, 0);
        assert!((band.pcr - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn analyze_splits_support_and_resistance_bands() {
        let c = chain(vec![
            row(650, 5, 50),   // support band [600, 800]
            row(1000, 10, 10), // near band [800, 1200]
            row(1350, 50, 5),  // resistance band [1200, 1400]
        ]);

        let report = analyze(&c, 1000.0, 200.0);

        assert_eq!(report.support.pe_oi, 50);
        assert_eq!(report.resistance.ce_oi, 50);
        assert!((report.support.pcr - 10.0).abs() < f64::EPSILON);
        assert!((report.resistance.pcr - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn divergence_flags_local_put_buildup() {
        // Global chain balanced; strikes near spot are put-heavy.
        let c = chain(vec![
            row(500, 1000, 100), // far from spot, call-heavy
            row(1000, 100, 1000), // near spot, put-heavy
        ]);

        let d = divergence(&c, 1000.0);

        assert_eq!(d.kind, DivergenceKind::NearZonePeHeavy);
        assert_eq!(d.implication, PcrImplication::FadeGlobalPcr);
        assert!(d.divergence > FADE_THRESHOLD);
    }

    #[test]
    fn divergence_balanced_trusts_global() {
        let c = chain(vec![row(950, 100, 100), row(1050, 100, 100)]);

        let d = divergence(&c, 1000.0);

        assert_eq!(d.kind, DivergenceKind::Balanced);
        assert_eq!(d.implication, PcrImplication::TrustGlobalPcr);
    }
}
