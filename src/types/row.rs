//! Decorated Row Types
//!
//! Render-ready output of the valuation merge: positions with live economics
//! attached, plus the portfolio-level scalars fed to summary widgets.

use crate::types::position::Direction;
use serde::{Deserialize, Serialize};

/// A basket leg with its per-refresh live fields attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstituentRow {
    pub symbol: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub qty: f64,
    pub avg_price: f64,
    pub product: String,
    /// Absent when no live quote is available for the leg.
    pub ltp: Option<f64>,
    /// Zero for the refresh when the leg is unquoted.
    pub pnl: f64,
}

/// A position decorated with live economics for the current refresh pass.
///
/// `pnl` and `open_risk` are always populated; `ltp`, `margin_blocked` and
/// `gross_exposure` stay `None` when the figure is unavailable so renderers
/// can show a placeholder instead of a misleading zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRow {
    pub id: String,
    pub trading_symbol: String,
    pub exchange: String,
    pub segment: String,
    pub product: String,
    #[serde(rename = "type")]
    pub direction: Option<Direction>,
    pub is_basket: bool,
    pub qty: Option<f64>,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub ltp: Option<f64>,
    pub pnl: f64,
    pub open_risk: f64,
    pub margin_blocked: Option<f64>,
    pub gross_exposure: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constituents: Vec<ConstituentRow>,
}

/// Portfolio-level totals folded from the decorated row set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    #[serde(rename = "totalUnrealizedPnL")]
    pub total_unrealized_pnl: f64,
    #[serde(rename = "totalOpenRisk")]
    pub total_open_risk: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_absent_ltp_as_null() {
        let row = PositionRow {
            id: "OPEN_1".to_string(),
            trading_symbol: "SBIN".to_string(),
            exchange: "NSE".to_string(),
            segment: "EQ".to_string(),
            product: "NRML".to_string(),
            direction: Some(Direction::Long),
            is_basket: false,
            qty: Some(10.0),
            entry_price: Some(600.0),
            stop_loss: None,
            ltp: None,
            pnl: 42.0,
            open_risk: 0.0,
            margin_blocked: None,
            gross_exposure: None,
            constituents: Vec::new(),
        };

        let value = serde_json::to_value(&row).unwrap();
        assert!(value["ltp"].is_null());
        assert_eq!(value["pnl"], 42.0);
        // Empty constituent lists are dropped from the wire entirely.
        assert!(value.get("constituents").is_none());
    }

    #[test]
    fn test_totals_wire_names() {
        let totals = PortfolioTotals {
            total_unrealized_pnl: 100.0,
            total_open_risk: 50.0,
        };
        let value = serde_json::to_value(totals).unwrap();
        assert_eq!(value["totalUnrealizedPnL"], 100.0);
        assert_eq!(value["totalOpenRisk"], 50.0);
    }
}
