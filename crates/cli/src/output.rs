//! File sinks for a cycle's results.
//!
//! The engine returns in-memory structures; everything that touches disk
//! lives here. A sink failure is logged and swallowed so the polling loop
//! keeps its results.

use anyhow::{Context, Result};
use csv::Writer;
use option_pulse_core::{RunReport, Signal, SinkConfig};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

/// Writes the dashboard JSON, the raw signal list, and the two CSV exports.
pub struct SignalSink {
    config: SinkConfig,
}

impl SignalSink {
    /// Creates a sink over the configured output paths.
    #[must_use]
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }

    /// Writes every configured output; failures are reported per sink and
    /// never propagate.
    pub fn write_all(&self, report: &RunReport) {
        let sinks: [(&str, Result<()>); 4] = [
            (
                self.config.dashboard_path.as_str(),
                self.write_dashboard(report),
            ),
            (
                self.config.latest_signals_path.as_str(),
                self.write_latest(report),
            ),
            (
                self.config.signals_csv_path.as_str(),
                self.write_signals_csv(report),
            ),
            (
                self.config.detailed_csv_path.as_str(),
                self.write_detailed_csv(report),
            ),
        ];

        for (path, result) in sinks {
            match result {
                Ok(()) => info!(path = %path, "Wrote sink"),
                Err(e) => warn!(path = %path, error = %e, "Sink write failed"),
            }
        }
    }

    /// Dashboard JSON: summary rows plus the ranked picks.
    fn write_dashboard(&self, report: &RunReport) -> Result<()> {
        let market: Vec<serde_json::Value> = report
            .summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "symbol": s.symbol,
                    "price": s.underlying,
                    "atm": s.atm_strike,
                    "strikes": s.strikes_analyzed.len(),
                    "signal": s.label,
                    "updated": s.timestamp,
                })
            })
            .collect();

        let dashboard = serde_json::json!({
            "last_updated": report.generated_at,
            "signals": report.signals,
            "market": market,
            "top_buy": report.top_buys,
            "top_sell": report.top_sells,
        });

        write_json(&self.config.dashboard_path, &dashboard)
    }

    /// Raw signal list for downstream consumers.
    fn write_latest(&self, report: &RunReport) -> Result<()> {
        write_json(&self.config.latest_signals_path, &report.signals)
    }

    /// Flattened one-row-per-signal CSV.
    fn write_signals_csv(&self, report: &RunReport) -> Result<()> {
        ensure_parent(&self.config.signals_csv_path)?;
        let file = File::create(&self.config.signals_csv_path)
            .with_context(|| format!("Failed to create {}", self.config.signals_csv_path))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record([
            "symbol",
            "signal",
            "side",
            "strike",
            "atm",
            "distance_from_atm",
            "ltp",
            "oi",
            "coi",
            "volume",
            "iv",
            "score",
            "price_trend",
            "ema_trend",
            "vwap_dev",
            "iv_trend",
            "oi_velocity",
            "pcr",
            "oi_ratio",
            "timestamp",
        ])?;

        for signal in &report.signals {
            writer.write_record(&signal_record(signal))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Per-strike window rows with both sides, one row per (symbol, strike).
    fn write_detailed_csv(&self, report: &RunReport) -> Result<()> {
        ensure_parent(&self.config.detailed_csv_path)?;
        let file = File::create(&self.config.detailed_csv_path)
            .with_context(|| format!("Failed to create {}", self.config.detailed_csv_path))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record([
            "symbol",
            "strike",
            "ce_oi",
            "pe_oi",
            "ce_coi",
            "pe_coi",
            "ce_vol",
            "pe_vol",
            "ce_iv",
            "pe_iv",
            "ce_ltp",
            "pe_ltp",
            "ce_strength",
            "pe_strength",
        ])?;

        for summary in &report.summaries {
            for row in &summary.rows {
                writer.write_record(&[
                    summary.symbol.clone(),
                    row.strike.to_string(),
                    row.call.oi.to_string(),
                    row.put.oi.to_string(),
                    row.call.coi.to_string(),
                    row.put.coi.to_string(),
                    row.call.volume.to_string(),
                    row.put.volume.to_string(),
                    row.call.iv.to_string(),
                    row.put.iv.to_string(),
                    row.call.ltp.to_string(),
                    row.put.ltp.to_string(),
                    row.call.strength().to_string(),
                    row.put.strength().to_string(),
                ])?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

fn signal_record(signal: &Signal) -> Vec<String> {
    vec![
        signal.symbol.clone(),
        signal.label.to_string(),
        signal.side.to_string(),
        signal.strike.to_string(),
        signal.atm_strike.to_string(),
        signal.distance_from_atm.to_string(),
        signal.ltp.to_string(),
        signal.oi.to_string(),
        signal.coi.to_string(),
        signal.volume.to_string(),
        signal.iv.to_string(),
        signal.score.to_string(),
        signal.metrics.price_trend_pct.to_string(),
        signal.metrics.ema_delta.to_string(),
        signal.metrics.vwap_dev_pct.to_string(),
        signal.metrics.iv_delta.to_string(),
        signal.metrics.oi_velocity.to_string(),
        signal.pcr.to_string(),
        signal.oi_ratio.to_string(),
        signal.timestamp.to_rfc3339(),
    ]
}

fn write_json(path: &str, value: &impl serde::Serialize) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn ensure_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
