//! Application configuration.
//!
//! Every tunable the engine consumes lives here as a named field with a
//! documented default. The normalization bounds and score weights are
//! heuristic calibrations carried over from production use; they are
//! config, not embedded literals, so they can be re-tuned without code
//! changes.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Symbols to poll each cycle, processed strictly in order.
    pub symbols: Vec<String>,
    /// Path of the persisted snapshot generation.
    pub snapshot_path: String,
    pub fetch: FetchConfig,
    pub engine: EngineConfig,
    pub sinks: SinkConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: [
                "NIFTY",
                "BANKNIFTY",
                "RELIANCE",
                "TCS",
                "INFY",
                "HDFCBANK",
                "ICICIBANK",
                "KOTAKBANK",
                "BHARTIARTL",
                "ITC",
                "SBIN",
                "LT",
                "AXISBANK",
                "MARUTI",
                "HINDUNILVR",
                "BAJFINANCE",
                "ADANIENT",
                "ULTRACEMCO",
                "SUNPHARMA",
                "WIPRO",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            snapshot_path: "data/previous_snapshot.json".to_string(),
            fetch: FetchConfig::default(),
            engine: EngineConfig::default(),
            sinks: SinkConfig::default(),
        }
    }
}

/// Chain-fetch collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Exchange base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum spacing between chain requests, milliseconds.
    pub pause_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nseindia.com".to_string(),
            timeout_secs: 12,
            pause_ms: 600,
        }
    }
}

/// Signal-engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// EMA period for LTP momentum; alpha = 2 / (period + 1).
    pub ema_period: u32,
    /// Strikes on each side of ATM in the analyzed window.
    pub window_strikes: usize,
    /// Length of the ranked top-buy/top-sell lists.
    pub top_n: usize,
    /// Candidates below this own-side volume are illiquid...
    pub min_candidate_volume: u64,
    /// ...unless combined call+put OI at the strike reaches this floor.
    pub min_combined_oi: u64,
    pub weights: ScoreWeights,
    pub bounds: NormBounds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ema_period: 3,
            window_strikes: 5,
            top_n: 3,
            min_candidate_volume: 10,
            min_combined_oi: 50,
            weights: ScoreWeights::default(),
            bounds: NormBounds::default(),
        }
    }
}

/// Fixed weights of the composite score; sum to 1.0 by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub price_trend: f64,
    pub ema_momentum: f64,
    pub vwap_dev: f64,
    pub iv_trend: f64,
    pub oi_velocity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            price_trend: 0.30,
            ema_momentum: 0.20,
            vwap_dev: 0.15,
            iv_trend: 0.20,
            oi_velocity: 0.15,
        }
    }
}

/// Clamp domains used to normalize raw metrics into [-1, 1].
///
/// Each metric is clamped to ± the named bound, then divided by it.
/// Calibration is heuristic (carried over from observed intraday ranges).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormBounds {
    /// Underlying price trend, percent.
    pub price_trend_pct: f64,
    /// EMA delta, absolute price units.
    pub ema_delta: f64,
    /// VWAP deviation, percent.
    pub vwap_dev_pct: f64,
    /// IV delta, volatility points.
    pub iv_delta: f64,
    /// OI velocity, contracts per minute.
    pub oi_velocity: f64,
}

impl Default for NormBounds {
    fn default() -> Self {
        Self {
            price_trend_pct: 3.0,
            ema_delta: 5.0,
            vwap_dev_pct: 10.0,
            iv_delta: 5.0,
            oi_velocity: 1000.0,
        }
    }
}

/// Output file locations for the CLI sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Dashboard JSON (summary rows + ranked picks).
    pub dashboard_path: String,
    /// Raw signal list JSON.
    pub latest_signals_path: String,
    /// Flattened signal rows CSV.
    pub signals_csv_path: String,
    /// Per-strike window rows CSV.
    pub detailed_csv_path: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            dashboard_path: "docs/dashboard.json".to_string(),
            latest_signals_path: "signals/latest.json".to_string(),
            signals_csv_path: "option_signals.csv".to_string(),
            detailed_csv_path: "detailed_option_data.csv".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        let sum = w.price_trend + w.ema_momentum + w.vwap_dev + w.iv_trend + w.oi_velocity;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_bounds_are_positive() {
        let b = NormBounds::default();
        assert!(b.price_trend_pct > 0.0);
        assert!(b.ema_delta > 0.0);
        assert!(b.vwap_dev_pct > 0.0);
        assert!(b.iv_delta > 0.0);
        assert!(b.oi_velocity > 0.0);
    }

    #[test]
    fn default_engine_config_matches_calibration() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.ema_period, 3);
        assert_eq!(cfg.window_strikes, 5);
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.min_candidate_volume, 10);
        assert_eq!(cfg.min_combined_oi, 50);
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"symbols": ["NIFTY"]}"#).unwrap();
        assert_eq!(cfg.symbols, vec!["NIFTY".to_string()]);
        assert_eq!(cfg.engine.ema_period, 3);
        assert_eq!(cfg.fetch.timeout_secs, 12);
    }

    #[test]
    fn default_symbol_list_is_nonempty() {
        let cfg = AppConfig::default();
        assert!(cfg.symbols.len() >= 2);
        assert_eq!(cfg.symbols[0], "NIFTY");
    }
}
