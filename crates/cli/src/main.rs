use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use option_pulse_core::{AppConfig, ChainProvider, ConfigLoader, RunReport};
use option_pulse_engine::{SignalEngine, SnapshotStore};
use option_pulse_nse::{is_market_open, NseClient};

mod output;

use output::SignalSink;

#[derive(Parser)]
#[command(name = "option-pulse")]
#[command(about = "NSE option-chain signal engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one polling cycle and write the output sinks
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Run even when the market calendar says the exchange is closed
        #[arg(long)]
        force: bool,
    },
    /// Poll repeatedly on an interval, gated by the market calendar
    Watch {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Seconds between cycles
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
    /// Fetch one symbol's chain and print its stateless analytics
    Analyze {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Symbol to analyze
        #[arg(long)]
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, force } => {
            run_once(&config, force).await?;
        }
        Commands::Watch {
            config,
            interval_secs,
        } => {
            run_watch(&config, interval_secs).await?;
        }
        Commands::Analyze { config, symbol } => {
            run_analyze(&config, &symbol).await?;
        }
    }

    Ok(())
}

/// True when the exchange trades today (exchange-local date).
fn market_open_today() -> bool {
    let today = Utc::now().with_timezone(&chrono_tz::Asia::Kolkata).date_naive();
    is_market_open(today)
}

async fn run_once(config_path: &str, force: bool) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    if !force && !market_open_today() {
        tracing::info!("Market is closed today; pass --force to run anyway");
        return Ok(());
    }

    let report = run_cycle(&config).await?;
    print_report(&report);
    SignalSink::new(config.sinks.clone()).write_all(&report);

    Ok(())
}

async fn run_watch(config_path: &str, interval_secs: u64) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let client = NseClient::new(&config.fetch)?;
    let store = SnapshotStore::new(&config.snapshot_path);
    let engine = SignalEngine::new(
        client,
        store,
        config.symbols.clone(),
        config.engine.clone(),
    );
    let sink = SignalSink::new(config.sinks.clone());

    tracing::info!(interval_secs, "Polling loop started, Ctrl+C to stop");

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !market_open_today() {
                    tracing::info!("Market closed, skipping cycle");
                    continue;
                }
                let report = engine.run_cycle().await;
                print_report(&report);
                sink.write_all(&report);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping polling loop");
                break;
            }
        }
    }

    Ok(())
}

async fn run_cycle(config: &AppConfig) -> Result<RunReport> {
    let client = NseClient::new(&config.fetch)?;
    let store = SnapshotStore::new(&config.snapshot_path);
    let engine = SignalEngine::new(
        client,
        store,
        config.symbols.clone(),
        config.engine.clone(),
    );
    Ok(engine.run_cycle().await)
}

async fn run_analyze(config_path: &str, symbol: &str) -> Result<()> {
    use option_pulse_analytics::{atm_iv_skew, elasticity, max_pain, zone_pcr};

    let config = ConfigLoader::load_from(config_path)?;
    let client = NseClient::new(&config.fetch)?;
    let chain = client.fetch_chain(symbol).await?;

    let prior = SnapshotStore::new(&config.snapshot_path).load();
    let spot_change = option_pulse_engine::metrics::price_trend_pct(
        prior.underlying(symbol),
        chain.underlying,
    );

    println!("\n{}", "=".repeat(72));
    println!(
        "{} @ {:.2}  (expiry {}, {} strikes, spot move {:+.2}%)",
        chain.symbol,
        chain.underlying,
        chain.expiry,
        chain.rows.len(),
        spot_change
    );
    println!("{}", "=".repeat(72));

    println!("ATM IV skew (CE - PE): {:+.2}", atm_iv_skew(&chain));

    if let Some(report) = max_pain::max_pain(&chain) {
        println!(
            "Max pain: {}  (pain {:.0}, synthetic pin {:.1})",
            report.max_pain, report.max_pain_value, report.synthetic_pin
        );
        for cluster in &report.clusters {
            println!(
                "  OI cluster @ {}  z={:.2}  {} dominant",
                cluster.strike, cluster.pain_zscore, cluster.dominance
            );
        }
    } else {
        println!("Max pain: no open interest on the chain");
    }

    let zones = zone_pcr::analyze(&chain, chain.underlying, zone_pcr::DEFAULT_ZONE_WIDTH);
    println!(
        "PCR  global {:.3} | near {:.3} | support {:.3} | resistance {:.3}",
        zones.global_pcr, zones.near.pcr, zones.support.pcr, zones.resistance.pcr
    );
    println!(
        "PCR divergence {:+.3} ({:?}) -> {:?}",
        zones.divergence.divergence, zones.divergence.kind, zones.divergence.implication
    );

    // One-shot invocation has no LTP history, so elasticity reads pure
    // expected-move sensitivity off the current chain.
    let window = chain
        .window(config.engine.window_strikes)
        .map(|w| w.strikes())
        .unwrap_or_default();
    let elasticity_report = elasticity::analyze(
        &chain,
        spot_change,
        &std::collections::HashMap::new(),
        &window,
        &elasticity::ElasticityConfig::default(),
    );
    println!(
        "Elasticity: {} sticky, {} elastic, gamma risk {:.2}",
        elasticity_report.sticky_zones.len(),
        elasticity_report.elastic_zones.len(),
        elasticity_report.gamma_risk
    );
    println!();

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n{}", "=".repeat(88));
    println!(
        "Cycle {}  -  {} symbols, {} signals",
        report.generated_at.format("%Y-%m-%d %H:%M:%S"),
        report.summaries.len(),
        report.signals.len()
    );
    println!("{}", "=".repeat(88));
    println!(
        "{:<12} {:<12} {:>6} {:>8} {:>10} {:>8} {:>8} {:>8}",
        "Symbol", "Signal", "Side", "Strike", "LTP", "Score", "PCR", "OI ratio"
    );
    println!("{}", "-".repeat(88));

    for signal in &report.signals {
        println!(
            "{:<12} {:<12} {:>6} {:>8} {:>10.2} {:>8.2} {:>8.3} {:>8.3}",
            signal.symbol,
            signal.label.to_string(),
            signal.side.to_string(),
            signal.strike,
            signal.ltp,
            signal.score,
            signal.pcr,
            signal.oi_ratio
        );
    }
    if report.signals.is_empty() {
        println!("(no clear signals this cycle)");
    }

    if !report.top_buys.is_empty() {
        let picks: Vec<String> = report
            .top_buys
            .iter()
            .map(|s| format!("{} {} @{}", s.symbol, s.side, s.strike))
            .collect();
        println!("Top buys:  {}", picks.join(", "));
    }
    if !report.top_sells.is_empty() {
        let picks: Vec<String> = report
            .top_sells
            .iter()
            .map(|s| format!("{} {} @{}", s.symbol, s.side, s.strike))
            .collect();
        println!("Top sells: {}", picks.join(", "));
    }
    println!();
}
