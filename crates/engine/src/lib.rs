//! Incremental option-chain signal engine.
//!
//! The engine combines five incrementally tracked microstructure metrics
//! (price trend, EMA momentum, VWAP deviation, IV trend, OI velocity)
//! into one composite score per strike, picks the best strike for the
//! side the sentiment classifier decided, and persists exactly one
//! generation of per-strike state between polling cycles.

pub mod metrics;
pub mod orchestrator;
pub mod scorer;
pub mod selector;
pub mod sentiment;
pub mod snapshot;

pub use metrics::{observe_strike, StrikeDeltas, StrikeObservation};
pub use orchestrator::SignalEngine;
pub use scorer::composite_score;
pub use selector::select_candidate;
pub use sentiment::classify;
pub use snapshot::{Snapshot, SnapshotError, SnapshotStore, StrikeState, SymbolState};
