//! Vantage - Position aggregation and live-valuation server
//!
//! Merges static trade records from the trade store with streaming LTP
//! quotes, margin, and exposure figures into a consistent per-row and
//! portfolio-level view, including the basket (multi-leg) rollup, and serves
//! the decorated rows to the presentation layer.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use services::{PositionBoard, SessionState};
use sources::TradeStoreClient;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub session: Arc<SessionState>,
    pub trade_store: TradeStoreClient,
    pub board: Arc<PositionBoard>,
}

// Re-export commonly used types
pub use services::{BoardSnapshot, TtlCache};
pub use types::*;
