//! Chain-level sentiment classification.
//!
//! A stateless rule table over two freshly computed ratios decides whether
//! a signal exists this cycle and which side it favors. High put/call OI
//! ratios read as bullish (puts written as support), low ones as bearish.

use option_pulse_core::{Side, SignalLabel};

/// Threshold above which the whole-chain PCR scores two bullish points.
pub const PCR_STRONG_BULL: f64 = 1.5;
/// Threshold above which the whole-chain PCR scores one bullish point.
pub const PCR_BULL: f64 = 1.2;
/// Threshold below which the whole-chain PCR scores two bearish points.
pub const PCR_STRONG_BEAR: f64 = 0.6;
/// Threshold below which the whole-chain PCR scores one bearish point.
pub const PCR_BEAR: f64 = 0.8;
/// Local-window OI ratio threshold for one bullish point.
pub const LOCAL_BULL: f64 = 1.3;
/// Local-window OI ratio threshold for one bearish point.
pub const LOCAL_BEAR: f64 = 0.7;

/// Decides side and strength from the whole-chain PCR and the ATM-window
/// OI ratio. Returns `None` when neither camp reaches two points.
#[must_use]
pub fn classify(pcr: f64, local_oi_ratio: f64) -> Option<(Side, SignalLabel)> {
    let mut bullish = 0u8;
    let mut bearish = 0u8;

    if pcr >= PCR_STRONG_BULL {
        bullish += 2;
    } else if pcr >= PCR_BULL {
        bullish += 1;
    }

    if pcr <= PCR_STRONG_BEAR {
        bearish += 2;
    } else if pcr <= PCR_BEAR {
        bearish += 1;
    }

    if local_oi_ratio >= LOCAL_BULL {
        bullish += 1;
    } else if local_oi_ratio <= LOCAL_BEAR {
        bearish += 1;
    }

    // First matching rule wins; bullish outranks bearish.
    if bullish >= 3 {
        Some((Side::Call, SignalLabel::StrongBuy))
    } else if bullish >= 2 {
        Some((Side::Call, SignalLabel::Buy))
    } else if bearish >= 3 {
        Some((Side::Put, SignalLabel::StrongSell))
    } else if bearish >= 2 {
        Some((Side::Put, SignalLabel::Sell))
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
