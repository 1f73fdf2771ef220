//! Persisted per-strike state and its store.
//!
//! One generation of state survives between polling cycles. The prior
//! generation is read-only input for a run; a brand-new generation is
//! accumulated from the current observations and committed once at the
//! end, wholly replacing the file on disk. Deeper history exists only
//! through the EMA's exponential memory and the lifetime VWAP
//! accumulators.
//!
//! Loading degrades to an empty cold-start state on any failure; a commit
//! failure is reported to the caller but never aborts a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from snapshot persistence operations.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// IO error reading/writing the snapshot file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Incremental state for one strike of one symbol.
///
/// `cum_vwap_num` and `cum_vol` are lifetime accumulators: they never
/// reset within a generation chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeState {
    /// EMA of the option's last traded price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_ltp: Option<f64>,
    /// Accumulated price × volume.
    pub cum_vwap_num: f64,
    /// Accumulated volume.
    pub cum_vol: u64,
    /// Last observed implied volatility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<f64>,
    /// Last observed change-in-open-interest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coi: Option<i64>,
}

/// Per-symbol slice of a generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolState {
    /// Last known underlying price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<f64>,
    /// Per-strike incremental state, keyed by integer strike.
    pub strikes: HashMap<i64, StrikeState>,
}

impl SymbolState {
    /// Returns the state recorded for `strike`, if any.
    #[must_use]
    pub fn strike(&self, strike: i64) -> Option<&StrikeState> {
        self.strikes.get(&strike)
    }
}

/// One persisted generation of engine state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Commit time of this generation; `None` on a cold start.
    pub timestamp: Option<DateTime<Utc>>,
    /// Per-symbol state.
    pub symbols: HashMap<String, SymbolState>,
}

impl Snapshot {
    /// Creates the next-generation accumulator stamped with the run time.
    #[must_use]
    pub fn next_generation(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(now),
            symbols: HashMap::new(),
        }
    }

    /// Returns the symbol slice, if this generation has seen the symbol.
    #[must_use]
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolState> {
        self.symbols.get(symbol)
    }

    /// Last known underlying price for `symbol`.
    #[must_use]
    pub fn underlying(&self, symbol: &str) -> Option<f64> {
        self.symbols.get(symbol).and_then(|s| s.underlying)
    }
}

/// Loads and commits snapshot generations.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store over the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the store path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a committed generation exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the last committed generation.
    ///
    /// Degrades to an empty cold-start snapshot if the file is missing,
    /// unreadable, or malformed; this boundary never raises.
    #[must_use]
    pub fn load(&self) -> Snapshot {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No snapshot file, cold start");
            return Snapshot::default();
        }

        match self.load_internal() {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    symbols = snapshot.symbols.len(),
                    "Loaded prior snapshot generation"
                );
                snapshot
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load snapshot, cold start"
                );
                Snapshot::default()
            }
        }
    }

    fn load_internal(&self) -> Result<Snapshot, SnapshotError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        Ok(snapshot)
    }

    /// Commits the next generation, wholly replacing the prior file.
    ///
    /// Creates parent directories if they don't exist.
    ///
    /// # Errors
    /// Returns an error when the file cannot be written; the caller is
    /// expected to downgrade this to a warning and keep its results.
    pub fn commit(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, snapshot)?;

        debug!(
            path = %self.path.display(),
            symbols = snapshot.symbols.len(),
            "Committed snapshot generation"
        );

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn temp_path() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        (dir, path)
    }

    fn sample_snapshot() -> Snapshot {
        let mut strikes = HashMap::new();
        strikes.insert(
            22500,
            StrikeState {
                ema_ltp: Some(110.5),
                cum_vwap_num: 3000.0,
                cum_vol: 200,
                iv: Some(14.2),
                coi: Some(1500),
            },
        );
        let mut symbols = HashMap::new();
        symbols.insert(
            "NIFTY".to_string(),
            SymbolState {
                underlying: Some(22512.3),
                strikes,
            },
        );
        Snapshot {
            timestamp: Some(Utc::now()),
            symbols,
        }
    }

    // =========================================================================
    // Roundtrip Tests
    // =========================================================================

    #[test]
    fn commit_load_roundtrip_preserves_state() {
        let (_dir, path) = temp_path();
        let store = SnapshotStore::new(path);

        let snapshot = sample_snapshot();
        store.commit(&snapshot).unwrap();

        let loaded = store.load();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn commit_overwrites_prior_generation() {
        let (_dir, path) = temp_path();
        let store = SnapshotStore::new(path);

        store.commit(&sample_snapshot()).unwrap();

        let mut replacement = Snapshot::next_generation(Utc::now());
        replacement
            .symbols
            .insert("TCS".to_string(), SymbolState::default());
        store.commit(&replacement).unwrap();

        let loaded = store.load();

        // Only the replacement generation survives.
        assert!(loaded.symbols.contains_key("TCS"));
        assert!(!loaded.symbols.contains_key("NIFTY"));
    }

    #[test]
    fn commit_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state").join("snap.json");
        let store = SnapshotStore::new(path.clone());

        store.commit(&sample_snapshot()).unwrap();

        assert!(path.exists());
    }

    // =========================================================================
    // Cold-Start Degradation Tests
    // =========================================================================

    #[test]
    fn missing_file_loads_empty_snapshot() {
        let (_dir, path) = temp_path();
        let store = SnapshotStore::new(path);

        let loaded = store.load();

        assert!(loaded.timestamp.is_none());
        assert!(loaded.symbols.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty_snapshot() {
        let (_dir, path) = temp_path();
        let mut file = File::create(&path).unwrap();
        file.write_all(b"not valid json {{{").unwrap();

        let store = SnapshotStore::new(path);
        let loaded = store.load();

        assert!(loaded.timestamp.is_none());
        assert!(loaded.symbols.is_empty());
    }

    #[test]
    fn empty_file_loads_empty_snapshot() {
        let (_dir, path) = temp_path();
        File::create(&path).unwrap();

        let store = SnapshotStore::new(path);
        let loaded = store.load();

        assert!(loaded.symbols.is_empty());
    }

    #[test]
    fn null_timestamp_is_accepted() {
        let (_dir, path) = temp_path();
        let mut file = File::create(&path).unwrap();
        file.write_all(br#"{"timestamp": null, "symbols": {}}"#).unwrap();

        let store = SnapshotStore::new(path);
        let loaded = store.load();

        assert!(loaded.timestamp.is_none());
    }

    // =========================================================================
    // Wire-Format Tests
    // =========================================================================

    #[test]
    fn json_keys_strikes_by_string() {
        let (_dir, path) = temp_path();
        let store = SnapshotStore::new(path.clone());
        store.commit(&sample_snapshot()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();

        let strike = &json["symbols"]["NIFTY"]["strikes"]["22500"];
        assert!((strike["ema_ltp"].as_f64().unwrap() - 110.5).abs() < f64::EPSILON);
        assert_eq!(strike["cum_vol"].as_u64().unwrap(), 200);
        assert_eq!(strike["coi"].as_i64().unwrap(), 1500);
    }

    #[test]
    fn partial_strike_fields_deserialize_with_defaults() {
        let (_dir, path) = temp_path();
        let mut file = File::create(&path).unwrap();
        file.write_all(
            br#"{"timestamp": null, "symbols": {"INFY": {"strikes": {"1500": {"ema_ltp": 12.5}}}}}"#,
        )
        .unwrap();

        let store = SnapshotStore::new(path);
        let loaded = store.load();

        let state = loaded.symbol("INFY").unwrap().strike(1500).unwrap();
        assert_eq!(state.ema_ltp, Some(12.5));
        assert_eq!(state.cum_vol, 0);
        assert!(state.iv.is_none());
        assert!(state.coi.is_none());
    }

    // =========================================================================
    // Accessor Tests
    // =========================================================================

    #[test]
    fn underlying_accessor_reads_symbol_state() {
        let snapshot = sample_snapshot();

        assert_eq!(snapshot.underlying("NIFTY"), Some(22512.3));
        assert_eq!(snapshot.underlying("TCS"), None);
    }

    #[test]
    fn next_generation_starts_empty_with_timestamp() {
        let now = Utc::now();
        let next = Snapshot::next_generation(now);

        assert_eq!(next.timestamp, Some(now));
        assert!(next.symbols.is_empty());
    }
}
