//! Margin/Exposure Service Client
//!
//! Both figures are priced from the same composite-aware request shape (one
//! item per position, baskets carrying their constituent legs). A fetch
//! failure degrades to an empty map with a warning rather than aborting the
//! merge; a missing id in the response means "unavailable", not zero.

use crate::error::{AppError, Result};
use crate::services::SessionState;
use crate::types::{AmountMap, MarginItem};
use reqwest::Client;
use std::sync::Arc;
use tracing::warn;

/// Margin and exposure REST client.
#[derive(Clone)]
pub struct MarginClient {
    client: Client,
    base_url: String,
    session: Arc<SessionState>,
}

impl MarginClient {
    /// Create a new margin/exposure client.
    pub fn new(base_url: String, session: Arc<SessionState>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    /// Fetch blocked margin per position id.
    pub async fn fetch_margins(&self, items: &[MarginItem]) -> AmountMap {
        self.fetch_amounts("margins", items).await
    }

    /// Fetch gross exposure per position id.
    pub async fn fetch_exposure(&self, items: &[MarginItem]) -> AmountMap {
        self.fetch_amounts("exposure", items).await
    }

    async fn fetch_amounts(&self, endpoint: &str, items: &[MarginItem]) -> AmountMap {
        if items.is_empty() {
            return AmountMap::new();
        }
        match self.post_items(endpoint, items).await {
            Ok(amounts) => amounts,
            Err(AppError::SessionExpired) => AmountMap::new(),
            Err(e) => {
                warn!("{} fetch degraded to empty map: {}", endpoint, e);
                AmountMap::new()
            }
        }
    }

    async fn post_items(&self, endpoint: &str, items: &[MarginItem]) -> Result<AmountMap> {
        let url = format!("{}/market-data/{}", self.base_url, endpoint);
        let response = self.client.post(&url).json(&items).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.session.mark_expired();
            return Err(AppError::SessionExpired);
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "{} fetch failed with {}",
                endpoint,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}
