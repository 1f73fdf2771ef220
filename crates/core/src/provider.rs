//! Seam between the engine and the chain-fetch collaborator.

use crate::chain::ChainSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Fetches and normalizes one symbol's option chain.
///
/// The orchestrator treats any error from this boundary as "no data for
/// that symbol this cycle": the symbol is skipped and the batch continues.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Retrieves the nearest-expiry chain for `symbol`.
    ///
    /// # Errors
    /// Returns an error when the chain cannot be fetched or parsed.
    async fn fetch_chain(&self, symbol: &str) -> Result<ChainSnapshot>;
}
