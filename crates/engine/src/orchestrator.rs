//! Per-cycle pipeline driver.
//!
//! Symbols are processed strictly sequentially, one strike at a time
//! within a symbol. The prior snapshot generation is read-only input; the
//! next generation accumulates in place as strikes are scored and is
//! committed exactly once at the end of the run. No failure below the
//! symbol level escapes this driver: the batch always completes and
//! returns whatever subset of signals was computable.

use crate::metrics::{elapsed_minutes, price_trend_pct, round_to};
use crate::selector::select_candidate;
use crate::sentiment::classify;
use crate::snapshot::{Snapshot, SnapshotStore};
use chrono::Utc;
use option_pulse_core::{
    ChainProvider, EngineConfig, RunReport, Signal, SignalLabel, SymbolSummary,
};
use tracing::{info, warn};

/// Drives fetch → classify → select across the configured symbols and
/// owns snapshot generation turnover.
pub struct SignalEngine<P> {
    provider: P,
    store: SnapshotStore,
    symbols: Vec<String>,
    config: EngineConfig,
}

impl<P: ChainProvider> SignalEngine<P> {
    /// Creates an engine over a chain provider and a snapshot store.
    pub fn new(
        provider: P,
        store: SnapshotStore,
        symbols: Vec<String>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            store,
            symbols,
            config,
        }
    }

    /// Runs one full polling cycle.
    ///
    /// Loads the prior generation, processes every configured symbol,
    /// ranks the produced signals, and commits the next generation. A
    /// symbol whose chain cannot be fetched or normalized is skipped; a
    /// snapshot write failure is reported as a warning and the computed
    /// signals are still returned.
    pub async fn run_cycle(&self) -> RunReport {
        let prior = self.store.load();
        let now = Utc::now();
        let elapsed = elapsed_minutes(prior.timestamp, now);
        let mut next = Snapshot::next_generation(now);

        let mut signals: Vec<Signal> = Vec::new();
        let mut summaries: Vec<SymbolSummary> = Vec::new();

        for symbol in &self.symbols {
            let chain = match self.provider.fetch_chain(symbol).await {
                Ok(chain) => chain,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "No chain data, skipping symbol");
                    continue;
                }
            };

            let Some(window) = chain.window(self.config.window_strikes) else {
                warn!(symbol = %symbol, "Empty chain window, skipping symbol");
                continue;
            };

            let prior_symbol = prior.symbol(symbol);
            let next_symbol = next.symbols.entry(symbol.clone()).or_default();
            next_symbol.underlying = Some(chain.underlying);

            let pcr = chain.put_call_ratio();
            let local_oi_ratio = window.local_oi_ratio();

            let mut fired: Option<SignalLabel> = None;
            if let Some((side, label)) = classify(pcr, local_oi_ratio) {
                let trend = price_trend_pct(
                    prior_symbol.and_then(|s| s.underlying),
                    chain.underlying,
                );

                if let Some(best) = select_candidate(
                    &window,
                    side,
                    trend,
                    prior_symbol,
                    next_symbol,
                    elapsed,
                    &self.config,
                ) {
                    info!(
                        symbol = %symbol,
                        label = %label,
                        side = %side,
                        strike = best.strike,
                        score = best.score,
                        "Signal fired"
                    );
                    fired = Some(label);
                    signals.push(Signal {
                        symbol: symbol.clone(),
                        label,
                        side,
                        strike: best.strike,
                        atm_strike: window.atm_strike,
                        distance_from_atm: (best.strike - window.atm_strike).abs(),
                        ltp: best.ltp,
                        oi: best.oi,
                        coi: best.coi,
                        volume: best.volume,
                        iv: best.iv,
                        score: best.score,
                        metrics: best.metrics,
                        pcr: round_to(pcr, 3),
                        oi_ratio: round_to(local_oi_ratio, 3),
                        timestamp: now,
                    });
                } else {
                    info!(symbol = %symbol, label = %label, "No liquid candidate for signal");
                }
            }

            summaries.push(SymbolSummary {
                symbol: symbol.clone(),
                underlying: chain.underlying,
                atm_strike: window.atm_strike,
                strikes_analyzed: window.strikes(),
                rows: window.rows,
                label: fired,
                timestamp: now,
            });
        }

        let top_buys = rank(&signals, self.config.top_n, SignalLabel::is_buy);
        let top_sells = rank(&signals, self.config.top_n, SignalLabel::is_sell);

        if let Err(e) = self.store.commit(&next) {
            warn!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to commit snapshot generation; signals are still returned"
            );
        }

        info!(
            symbols = summaries.len(),
            signals = signals.len(),
            "Cycle complete"
        );

        RunReport {
            generated_at: now,
            signals,
            top_buys,
            top_sells,
            summaries,
        }
    }
}

/// Ranks signals matching `filter` by descending score, truncated to `n`.
fn rank(signals: &[Signal], n: usize, filter: impl Fn(SignalLabel) -> bool) -> Vec<Signal> {
    let mut ranked: Vec<Signal> = signals
        .iter()
        .filter(|s| filter(s.label))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use option_pulse_core::{ChainSnapshot, OptionQuote, StrikeRow};
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves canned chains per symbol; unknown symbols error like a
    /// failed fetch.
    struct MockProvider {
        chains: HashMap<String, ChainSnapshot>,
    }

    #[async_trait]
    impl ChainProvider for MockProvider {
        async fn fetch_chain(&self, symbol: &str) -> Result<ChainSnapshot> {
            self.chains
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("fetch failed for {symbol}"))
        }
    }

    fn quote(oi: u64, coi: i64, ltp: f64, volume: u64) -> OptionQuote {
        OptionQuote {
            oi,
            coi,
            ltp,
            iv: 15.0,
            volume,
        }
    }

    /// A chain whose put OI triple-weights call OI everywhere: PCR 3.0 and
    /// local ratio 3.0 read as strongly bullish.
    fn bullish_chain(symbol: &str, underlying: f64) -> ChainSnapshot {
        let base = (underlying / 10.0).round() as i64 * 10;
        let rows = (-3..=3)
            .map(|i| StrikeRow {
                strike: base + i * 10,
                call: quote(100, 500, 12.0, 300),
                put: quote(300, 200, 9.0, 250),
            })
            .collect();
        ChainSnapshot {
            symbol: symbol.to_string(),
            underlying,
            expiry: "30-Jan-2025".to_string(),
            rows,
        }
    }

    /// A chain with equal OI on both sides: no sentiment either way.
    fn balanced_chain(symbol: &str, underlying: f64) -> ChainSnapshot {
        let base = (underlying / 10.0).round() as i64 * 10;
        let rows = (-3..=3)
            .map(|i| StrikeRow {
                strike: base + i * 10,
                call: quote(200, 0, 10.0, 100),
                put: quote(200, 0, 10.0, 100),
            })
            .collect();
        ChainSnapshot {
            symbol: symbol.to_string(),
            underlying,
            expiry: "30-Jan-2025".to_string(),
            rows,
        }
    }

    fn engine_with(
        chains: Vec<ChainSnapshot>,
        symbols: Vec<&str>,
        dir: &TempDir,
    ) -> SignalEngine<MockProvider> {
        let provider = MockProvider {
            chains: chains
                .into_iter()
                .map(|c| (c.symbol.clone(), c))
                .collect(),
        };
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));
        SignalEngine::new(
            provider,
            store,
            symbols.into_iter().map(String::from).collect(),
            EngineConfig::default(),
        )
    }

    // =========================================================================
    // Batch-Resilience Tests
    // =========================================================================

    #[tokio::test]
    async fn failed_symbol_is_skipped_batch_continues() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(
            vec![bullish_chain("NIFTY", 22500.0)],
            vec!["MISSING", "NIFTY"],
            &dir,
        );

        let report = engine.run_cycle().await;

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].symbol, "NIFTY");
        assert_eq!(report.signals.len(), 1);
    }

    #[tokio::test]
    async fn empty_chain_is_skipped() {
        let dir = TempDir::new().unwrap();
        let empty = ChainSnapshot {
            symbol: "EMPTY".to_string(),
            underlying: 100.0,
            expiry: "30-Jan-2025".to_string(),
            rows: vec![],
        };
        let engine = engine_with(vec![empty], vec!["EMPTY"], &dir);

        let report = engine.run_cycle().await;

        assert!(report.summaries.is_empty());
        assert!(report.signals.is_empty());
    }

    // =========================================================================
    // Signal-Flow Tests
    // =========================================================================

    #[tokio::test]
    async fn bullish_chain_fires_strong_buy_call() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(vec![bullish_chain("NIFTY", 22500.0)], vec!["NIFTY"], &dir);

        let report = engine.run_cycle().await;

        let signal = &report.signals[0];
        assert_eq!(signal.label, SignalLabel::StrongBuy);
        assert_eq!(signal.side, option_pulse_core::Side::Call);
        assert!((signal.pcr - 3.0).abs() < f64::EPSILON);
        assert_eq!(signal.atm_strike, 22500);
        assert_eq!(report.summaries[0].label, Some(SignalLabel::StrongBuy));
    }

    #[tokio::test]
    async fn balanced_chain_fires_nothing_but_still_summarized() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(vec![balanced_chain("TCS", 4000.0)], vec!["TCS"], &dir);

        let report = engine.run_cycle().await;

        assert!(report.signals.is_empty());
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].label, None);
    }

    // =========================================================================
    // Generation-Turnover Tests
    // =========================================================================

    #[tokio::test]
    async fn next_generation_is_committed_with_underlying() {
        let dir = TempDir::new().unwrap();
        let engine = engine_with(vec![balanced_chain("TCS", 4000.0)], vec!["TCS"], &dir);

        engine.run_cycle().await;

        let committed = SnapshotStore::new(dir.path().join("snapshot.json")).load();
        assert!(committed.timestamp.is_some());
        // Underlying is recorded even though no signal fired and no
        // strike was scored.
        assert_eq!(committed.underlying("TCS"), Some(4000.0));
        assert!(committed.symbol("TCS").unwrap().strikes.is_empty());
    }

    #[tokio::test]
    async fn second_cycle_sees_prior_generation() {
        let dir = TempDir::new().unwrap();

        let engine = engine_with(vec![bullish_chain("NIFTY", 22500.0)], vec!["NIFTY"], &dir);
        let first = engine.run_cycle().await;
        // Cold start: all deltas neutral except the COI contribution is
        // baseline-only, so velocity is 0 too.
        assert!((first.signals[0].metrics.oi_velocity - 0.0).abs() < f64::EPSILON);
        assert!((first.signals[0].metrics.price_trend_pct - 0.0).abs() < f64::EPSILON);

        // Second cycle: same strikes, underlying up 1%. Same COI
        // observation and a clamped 1-minute gap keep velocity at 0, but
        // price trend is live.
        let mut chain = bullish_chain("NIFTY", 22500.0);
        chain.underlying = 22725.0;
        let engine = engine_with(vec![chain], vec!["NIFTY"], &dir);
        let second = engine.run_cycle().await;

        let metrics = &second.signals[0].metrics;
        // (22725 - 22500) / 22500 * 100 = 1.0
        assert!((metrics.price_trend_pct - 1.0).abs() < f64::EPSILON);
        assert!(metrics.ema_prev.is_some());
    }

    #[tokio::test]
    async fn prior_generation_is_replaced_not_merged() {
        let dir = TempDir::new().unwrap();

        let engine = engine_with(vec![balanced_chain("TCS", 4000.0)], vec!["TCS"], &dir);
        engine.run_cycle().await;

        // Second run sees a different symbol only.
        let engine = engine_with(vec![balanced_chain("INFY", 1500.0)], vec!["INFY"], &dir);
        engine.run_cycle().await;

        let committed = SnapshotStore::new(dir.path().join("snapshot.json")).load();
        assert!(committed.symbol("INFY").is_some());
        assert!(committed.symbol("TCS").is_none());
    }

    // =========================================================================
    // Ranking Tests
    // =========================================================================

    #[tokio::test]
    async fn top_lists_rank_by_score_and_respect_top_n() {
        let dir = TempDir::new().unwrap();
        // Four bullish symbols; on a cold start they tie at the same
        // score, and the list still truncates to top_n.
        let chains: Vec<ChainSnapshot> = ["A", "B", "C", "D"]
            .iter()
            .map(|s| bullish_chain(s, 1000.0))
            .collect();
        let engine = engine_with(chains, vec!["A", "B", "C", "D"], &dir);

        let report = engine.run_cycle().await;

        assert_eq!(report.signals.len(), 4);
        assert_eq!(report.top_buys.len(), 3);
        assert!(report.top_sells.is_empty());
        for pair in report.top_buys.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
