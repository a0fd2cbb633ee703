//! Positions API
//!
//! Endpoints exposed to the presentation layer:
//! - GET /api/positions - decorated rows plus portfolio totals
//! - PUT /api/positions/:id/stop-loss - set or clear a stop-loss
//! - POST /api/baskets - group positions into a named basket
//! - POST /api/baskets/:id/add - add positions to an existing basket
//! - POST /api/sync - broker re-pull, invalidates derived caches

use crate::error::{AppError, Result};
use crate::sources::{BasketAdd, BasketCreate};
use crate::types::{PortfolioTotals, PositionRow, TradeUpdate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Create the positions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/positions", axum::routing::get(list_positions))
        .route("/positions/:id/stop-loss", put(set_stop_loss))
        .route("/baskets", post(create_basket))
        .route("/baskets/:id/add", post(add_to_basket))
        .route("/sync", post(sync))
}

// =============================================================================
// Response / Request Types
// =============================================================================

/// Row set plus portfolio scalars for the positions screen.
#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub data: Vec<PositionRow>,
    pub total: u64,
    #[serde(flatten)]
    pub totals: PortfolioTotals,
    pub market_open: bool,
}

#[derive(Debug, Deserialize)]
pub struct StopLossRequest {
    /// New stop-loss, or null to clear it.
    pub stop_loss: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/positions
async fn list_positions(State(state): State<AppState>) -> Json<PositionsResponse> {
    let snapshot = state.board.snapshot();
    Json(PositionsResponse {
        data: snapshot.rows,
        total: snapshot.total_positions,
        totals: snapshot.totals,
        market_open: state.board.market_open(),
    })
}

/// PUT /api/positions/:id/stop-loss
///
/// Persistence is delegated to the trade store; the in-memory row is not
/// patched directly. The affected row picks up the new stop on the refresh
/// pass scheduled here, avoiding drift between client- and server-held state.
async fn set_stop_loss(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StopLossRequest>,
) -> Result<Json<MutationResponse>> {
    if let Some(sl) = request.stop_loss {
        if !sl.is_finite() || sl < 0.0 {
            return Err(AppError::BadRequest(format!(
                "invalid stop-loss value: {}",
                sl
            )));
        }
    }

    let update = TradeUpdate {
        stop_loss: Some(request.stop_loss),
        ..Default::default()
    };
    state.trade_store.update_position(&id, &update).await?;
    info!(position = %id, stop_loss = ?request.stop_loss, "stop-loss updated");

    state.board.refresh_positions().await?;
    Ok(Json(MutationResponse { id }))
}

/// POST /api/baskets
async fn create_basket(
    State(state): State<AppState>,
    Json(request): Json<BasketCreate>,
) -> Result<Json<MutationResponse>> {
    if request.trade_ids.len() < 2 {
        return Err(AppError::BadRequest(
            "a basket needs at least two positions".to_string(),
        ));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("basket name is required".to_string()));
    }

    let basket = state.trade_store.create_basket(&request).await?;
    info!(basket = %basket.id, legs = request.trade_ids.len(), "basket created");

    state.board.refresh_positions().await?;
    Ok(Json(MutationResponse { id: basket.id }))
}

/// POST /api/baskets/:id/add
async fn add_to_basket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BasketAdd>,
) -> Result<Json<MutationResponse>> {
    if request.trade_ids.is_empty() {
        return Err(AppError::BadRequest(
            "no positions supplied to add".to_string(),
        ));
    }

    let basket = state.trade_store.add_to_basket(&id, &request).await?;
    info!(basket = %basket.id, added = request.trade_ids.len(), "positions added to basket");

    state.board.refresh_positions().await?;
    Ok(Json(MutationResponse { id: basket.id }))
}

/// POST /api/sync
async fn sync(State(state): State<AppState>) -> Result<Json<MutationResponse>> {
    state.board.sync().await?;
    Ok(Json(MutationResponse {
        id: "sync".to_string(),
    }))
}
