//! Margin Request Types
//!
//! The composite-aware request shape shared by the margin and exposure
//! collaborators: one item per position, baskets carrying one leg per
//! constituent, simple positions exactly one leg.

use serde::{Deserialize, Serialize};

/// Kind discriminator understood by the margin/exposure services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginItemKind {
    Trade,
    Basket,
}

/// A single order intent leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub exchange: String,
    pub tradingsymbol: String,
    /// "BUY" or "SELL"; the opening side of the leg's direction.
    pub transaction_type: String,
    pub quantity: f64,
    pub product: String,
    pub price: f64,
}

/// One margin/exposure request item, keyed by the position's own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginItem {
    #[serde(rename = "type")]
    pub kind: MarginItemKind,
    pub id: String,
    pub legs: Vec<OrderLeg>,
}
