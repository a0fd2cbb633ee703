//! Position Types
//!
//! Domain types for positions as held by the trade store: simple single-leg
//! positions and composite basket positions with constituent legs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl Direction {
    /// The broker-side transaction type that opens a position in this direction.
    pub fn opening_transaction(&self) -> &'static str {
        match self {
            Direction::Long => "BUY",
            Direction::Short => "SELL",
        }
    }
}

/// Position status filter accepted by the trade store listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "OPEN"),
            PositionStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

// =============================================================================
// Core Types
// =============================================================================

/// A single leg belonging to a basket position.
///
/// Constituents are exclusively owned by their parent basket and have no
/// lifecycle of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constituent {
    pub symbol: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub qty: f64,
    pub avg_price: f64,
    pub product: String,
}

/// What kind of holding a position is.
///
/// Basket positions carry no entry price or quantity of their own; their
/// economics are derived entirely from the constituent legs, which this
/// variant split makes unrepresentable any other way.
#[derive(Debug, Clone)]
pub enum PositionKind {
    Simple {
        entry_price: f64,
        qty: f64,
        direction: Direction,
        stop_loss: Option<f64>,
    },
    Basket {
        constituents: Vec<Constituent>,
    },
}

impl PositionKind {
    pub fn is_basket(&self) -> bool {
        matches!(self, PositionKind::Basket { .. })
    }
}

/// A holding tracked by the trade store, simple or basket.
///
/// Positions are created by the trade store (broker sync or manual entry) and
/// are read-only to the valuation core, which only decorates them with
/// transient live fields on each refresh pass.
#[derive(Debug, Clone)]
pub struct Position {
    /// Opaque id encoding source partition and numeric original id, e.g. "OPEN_42".
    pub id: String,
    pub trading_symbol: String,
    pub exchange: String,
    pub segment: String,
    pub product: String,
    pub entry_date: Option<DateTime<Utc>>,
    pub status: String,
    /// Last persisted PnL; 0 for freshly opened positions.
    pub stored_pnl: f64,
    pub setup_used: Option<String>,
    pub mistakes_made: Option<String>,
    pub notes: Option<String>,
    pub kind: PositionKind,
}

impl Position {
    /// The quote key used to look this instrument up in the quote map.
    pub fn quote_key(&self) -> String {
        format!("{}:{}", self.exchange, self.trading_symbol)
    }
}

// =============================================================================
// Wire Types (trade store)
// =============================================================================

/// A position as serialized by the trade store listing endpoint.
///
/// The store keeps basket membership as a flat record plus a `is_basket` flag
/// and a constituent list; [`StoredTrade::into_position`] lifts that into the
/// tagged [`PositionKind`] the valuation core dispatches on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTrade {
    pub id: String,
    pub original_id: i64,
    pub trading_symbol: String,
    pub exchange: String,
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub order_type: String,
    pub entry_date: Option<DateTime<Utc>>,
    pub qty: f64,
    pub entry_price: f64,
    #[serde(default)]
    pub pnl: f64,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(default)]
    pub is_basket: u8,
    pub stop_loss: Option<f64>,
    pub setup_used: Option<String>,
    pub mistakes_made: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub constituents: Vec<StoredConstituent>,
}

/// A basket leg as serialized by the trade store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConstituent {
    pub symbol: String,
    pub exchange: String,
    pub qty: f64,
    pub avg_price: f64,
    #[serde(default)]
    pub product: String,
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl StoredTrade {
    /// Lift the flat store record into the domain model.
    pub fn into_position(self) -> Position {
        let product = self.product_label();
        let kind = if self.is_basket == 1 {
            PositionKind::Basket {
                constituents: self
                    .constituents
                    .into_iter()
                    .map(|c| Constituent {
                        symbol: c.symbol,
                        exchange: c.exchange,
                        direction: c.direction,
                        qty: c.qty,
                        avg_price: c.avg_price,
                        product: c.product,
                    })
                    .collect(),
            }
        } else {
            PositionKind::Simple {
                entry_price: self.entry_price,
                qty: self.qty,
                direction: self.direction,
                stop_loss: self.stop_loss,
            }
        };

        Position {
            id: self.id,
            trading_symbol: self.trading_symbol,
            exchange: self.exchange,
            segment: self.segment,
            product,
            entry_date: self.entry_date,
            status: self.status,
            stored_pnl: self.pnl,
            setup_used: self.setup_used,
            mistakes_made: self.mistakes_made,
            notes: self.notes,
            kind,
        }
    }

    fn product_label(&self) -> String {
        if self.is_basket == 1 {
            "BASKET".to_string()
        } else if self.order_type.is_empty() {
            "NRML".to_string()
        } else {
            self.order_type.clone()
        }
    }
}

/// Paginated listing response from the trade store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedTrades {
    pub data: Vec<StoredTrade>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Partial update accepted by the trade store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mistakes_made: Option<String>,
    /// `Some(None)` clears the stop-loss, `Some(Some(v))` sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Option<f64>>,
}

/// Market open/closed signal from the trade store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketStatus {
    pub open: bool,
}
