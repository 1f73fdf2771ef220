//! Rate-limited NSE option-chain HTTP client.
//!
//! NSE serves the chain API only to sessions that look like a browser and
//! carry its cookies, so every fetch first warms the session against the
//! home page. Requests flow through a shared rate limiter to keep the
//! polling loop polite.

use crate::parser::{parse_chain, RawOptionChain};
use anyhow::Result;
use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use option_pulse_core::{ChainProvider, ChainSnapshot, FetchConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Index symbols served by the indices endpoint; everything else goes to
/// the equities endpoint.
const INDEX_SYMBOLS: [&str; 2] = ["NIFTY", "BANKNIFTY"];

/// Errors from fetching or normalizing a chain.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the chain endpoint.
    #[error("HTTP {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    /// Payload arrived but cannot be reduced to a chain.
    #[error("malformed chain for {symbol}: {reason}")]
    Malformed {
        symbol: String,
        reason: &'static str,
    },
}

/// HTTP client for the NSE option-chain API.
pub struct NseClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl NseClient {
    /// Builds a client from fetch configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        let period = Duration::from_millis(config.pause_ms.max(1));
        let quota = Quota::with_period(period).expect("non-zero politeness period");
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    fn is_index(symbol: &str) -> bool {
        INDEX_SYMBOLS.contains(&symbol)
    }

    fn chain_url(&self, symbol: &str) -> String {
        if Self::is_index(symbol) {
            format!("{}/api/option-chain-indices?symbol={symbol}", self.base_url)
        } else {
            format!(
                "{}/api/option-chain-equities?symbol={symbol}",
                self.base_url
            )
        }
    }

    /// Primes the session cookies; failures here are irrelevant because
    /// the chain request itself will surface them.
    async fn warm(&self) {
        self.rate_limiter.until_ready().await;
        if let Err(e) = self.http.get(&self.base_url).send().await {
            debug!(error = %e, "Session warm-up request failed");
        }
    }

    /// Fetches the raw option-chain payload for `symbol`.
    ///
    /// # Errors
    /// Returns [`FetchError`] on transport failure or a non-success
    /// status.
    pub async fn fetch_raw(&self, symbol: &str) -> Result<RawOptionChain, FetchError> {
        self.warm().await;
        self.rate_limiter.until_ready().await;

        let url = self.chain_url(symbol);
        debug!(symbol = %symbol, url = %url, "Fetching option chain");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let raw: RawOptionChain = response.json().await?;
        Ok(raw)
    }
}

#[async_trait]
impl ChainProvider for NseClient {
    async fn fetch_chain(&self, symbol: &str) -> Result<ChainSnapshot> {
        let raw = self.fetch_raw(symbol).await?;
        let chain = parse_chain(symbol, &raw)?;
        debug!(
            symbol = %symbol,
            strikes = chain.rows.len(),
            expiry = %chain.expiry,
            "Normalized chain"
        );
        Ok(chain)
    }
}

// =============================================================================
// Tests
// =============================================================================
