//! Max-pain and OI-cluster analysis.
//!
//! Pain at a strike is the premium at risk for option writers if the
//! underlying settles there: `ce_oi * ce_ltp + pe_oi * pe_ltp`. The
//! max-pain strike is the one minimizing total pain. The synthetic pin is
//! a pain-weighted mean over the significant strikes, a softer estimate of
//! where price tends to get pinned into expiry.

use option_pulse_core::{ChainSnapshot, Side};
use serde::{Deserialize, Serialize};

/// Pain decomposition for one strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPoint {
    pub strike: i64,
    /// Total premium at risk: `ce_pain + pe_pain`.
    pub pain: f64,
    pub ce_pain: f64,
    pub pe_pain: f64,
    /// `ce_pain - pe_pain`; sign marks which side dominates.
    pub net_pain: f64,
}

/// A strike whose pain stands out beyond one standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OiCluster {
    pub strike: i64,
    /// How many standard deviations this strike's pain sits above the mean.
    pub pain_zscore: f64,
    /// Which side's premium dominates the cluster.
    pub dominance: Side,
}

/// Direction of a max-pain drift across observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftDirection {
    Up,
    Down,
    Stable,
}

/// Result of a max-pain computation over one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPainReport {
    /// The pain-minimizing strike.
    pub max_pain: i64,
    /// Total pain at that strike.
    pub max_pain_value: f64,
    /// Pain-weighted mean strike over the significant cluster.
    pub synthetic_pin: f64,
    /// Strikes with outlier pain.
    pub clusters: Vec<OiCluster>,
}

/// Per-strike pain decomposition; strikes with no OI on either side are
/// skipped.
#[must_use]
pub fn pain_points(chain: &ChainSnapshot) -> Vec<PainPoint> {
    chain
        .rows
        .iter()
        .filter(|r| r.call.oi > 0 || r.put.oi > 0)
        .map(|r| {
            let ce_pain = r.call.oi as f64 * r.call.ltp;
            let pe_pain = r.put.oi as f64 * r.put.ltp;
            PainPoint {
                strike: r.strike,
                pain: ce_pain + pe_pain,
                ce_pain,
                pe_pain,
                net_pain: ce_pain - pe_pain,
            }
        })
        .collect()
}

/// Computes the max-pain report for a chain.
///
/// Returns `None` when no strike carries open interest.
#[must_use]
pub fn max_pain(chain: &ChainSnapshot) -> Option<MaxPainReport> {
    let points = pain_points(chain);
    let min_point = points.iter().min_by(|a, b| {
        a.pain
            .partial_cmp(&b.pain)
            .unwrap_or(std::cmp::Ordering::Equal)
    })?;

    // Pin from the strikes carrying significant pain relative to the
    // max-pain point.
    let threshold = min_point.pain * 0.5;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for point in &points {
        if point.pain > threshold {
            weighted_sum += point.strike as f64 * point.pain;
            total_weight += point.pain;
        }
    }
    let synthetic_pin = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        min_point.strike as f64
    };

    Some(MaxPainReport {
        max_pain: min_point.strike,
        max_pain_value: min_point.pain,
        synthetic_pin,
        clusters: identify_clusters(&points),
    })
}

/// Drift of the max-pain strike over an observation history, oldest first.
///
/// Compares the mean of the last five entries against the first five;
/// returns 0 / `Stable` until at least five entries exist.
#[must_use]
pub fn pain_shift(history: &[f64]) -> (f64, ShiftDirection) {
    if history.len() < 5 {
        return (0.0, ShiftDirection::Stable);
    }

    let head: f64 = history[..5].iter().sum::<f64>() / 5.0;
    let tail: f64 = history[history.len() - 5..].iter().sum::<f64>() / 5.0;
    let shift = tail - head;

    let direction = if shift > 0.0 {
        ShiftDirection::Up
    } else if shift < 0.0 {
        ShiftDirection::Down
    } else {
        ShiftDirection::Stable
    };

    (shift, direction)
}

fn identify_clusters(points: &[PainPoint]) -> Vec<OiCluster> {
    if points.is_empty() {
        return Vec::new();
    }

    let n = points.len() as f64;
    let mean = points.iter().map(|p| p.pain).sum::<f64>() / n;
    let variance = points.iter().map(|p| (p.pain - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    points
        .iter()
        .filter(|p| p.pain > mean + stddev)
        .map(|p| OiCluster {
            strike: p.strike,
            pain_zscore: if stddev > 0.0 {
                (p.pain - mean) / stddev
            } else {
                0.0
            },
            dominance: if p.net_pain > 0.0 {
                Side::Call
            } else {
                Side::Put
            },
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
