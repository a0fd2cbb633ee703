//! Quote Service Client
//!
//! Fetches live last-traded prices for a list of `"EXCHANGE:SYMBOL"` keys.
//! Keys the service cannot price are simply absent from the returned map;
//! downstream treats absence as "price unknown", never as zero.

use crate::error::{AppError, Result};
use crate::services::SessionState;
use crate::types::QuoteMap;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

/// Quote service REST client.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: String,
    session: Arc<SessionState>,
}

impl QuoteClient {
    /// Create a new quote client.
    pub fn new(base_url: String, session: Arc<SessionState>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    /// Fetch LTPs for the given keys. An empty key list short-circuits to an
    /// empty map without a network call.
    pub async fn fetch_ltp(&self, keys: &[String]) -> Result<QuoteMap> {
        if keys.is_empty() {
            return Ok(QuoteMap::new());
        }

        let url = format!("{}/market-data/ltp", self.base_url);
        let response = self.client.post(&url).json(&keys).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.session.mark_expired();
            return Err(AppError::SessionExpired);
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "quote fetch failed with {}",
                response.status()
            )));
        }

        let quotes: QuoteMap = response.json().await?;
        debug!(requested = keys.len(), priced = quotes.len(), "fetched LTPs");
        Ok(quotes)
    }
}
