pub mod chain;
pub mod config;
pub mod config_loader;
pub mod provider;
pub mod signal;

pub use chain::{ChainSnapshot, ChainWindow, OptionQuote, Side, StrikeRow};
pub use config::{AppConfig, EngineConfig, FetchConfig, NormBounds, ScoreWeights, SinkConfig};
pub use config_loader::ConfigLoader;
pub use provider::ChainProvider;
pub use signal::{Candidate, RunReport, Signal, SignalLabel, StrikeMetrics, SymbolSummary};
