//! Trade Store Client
//!
//! REST client for the trade store: position listing, stop-loss and journal
//! updates, basket creation/membership, broker sync, and the market-status
//! signal. Positions are owned by the store; this client never caches them.

use crate::error::{AppError, Result};
use crate::services::SessionState;
use crate::types::{MarketStatus, PaginatedTrades, PositionStatus, StoredTrade, TradeUpdate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Request body for basket creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketCreate {
    pub name: String,
    pub trade_ids: Vec<String>,
}

/// Request body for adding positions to an existing basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketAdd {
    pub trade_ids: Vec<String>,
}

/// Trade store REST client.
#[derive(Clone)]
pub struct TradeStoreClient {
    client: Client,
    base_url: String,
    session: Arc<SessionState>,
}

impl TradeStoreClient {
    /// Create a new trade store client.
    pub fn new(base_url: String, session: Arc<SessionState>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            session,
        }
    }

    /// List positions with the given status filter.
    pub async fn list_positions(
        &self,
        status: PositionStatus,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedTrades> {
        let url = format!("{}/trades", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("status", status.to_string()),
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
                ("sort_by", "entry_date".to_string()),
                ("sort_desc", "true".to_string()),
            ])
            .send()
            .await?;

        let response = self.check_session(response)?;
        let trades: PaginatedTrades = response.json().await?;
        debug!(
            total = trades.total,
            page = trades.page,
            "listed positions from trade store"
        );
        Ok(trades)
    }

    /// Apply a partial update (stop-loss, journal fields) to one position.
    pub async fn update_position(&self, id: &str, update: &TradeUpdate) -> Result<StoredTrade> {
        let url = format!("{}/trades/{}", self.base_url, id);
        let response = self.client.put(&url).json(update).send().await?;
        let response = self.check_session(response)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("position {}", id)));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "trade store update failed with {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Group existing positions into a new named basket.
    pub async fn create_basket(&self, request: &BasketCreate) -> Result<StoredTrade> {
        let url = format!("{}/trades/basket", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let response = self.check_session(response)?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "basket creation failed with {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Add positions to an existing basket.
    pub async fn add_to_basket(&self, basket_id: &str, request: &BasketAdd) -> Result<StoredTrade> {
        let url = format!("{}/trades/basket/{}/add", self.base_url, basket_id);
        let response = self.client.post(&url).json(request).send().await?;
        let response = self.check_session(response)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("basket {}", basket_id)));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "add-to-basket failed with {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Re-pull trades from the broker.
    pub async fn sync(&self) -> Result<()> {
        let url = format!("{}/sync", self.base_url);
        let response = self.client.post(&url).send().await?;
        let response = self.check_session(response)?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "broker sync failed with {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Whether the market is currently open.
    pub async fn market_status(&self) -> Result<MarketStatus> {
        let url = format!("{}/market-data/status", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = self.check_session(response)?;
        Ok(response.json().await?)
    }

    /// Map a 401 to the session-expired condition before anything else
    /// inspects the response.
    fn check_session(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.session.mark_expired();
            return Err(AppError::SessionExpired);
        }
        Ok(response)
    }
}
